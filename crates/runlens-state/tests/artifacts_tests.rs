use runlens_state::{FsArtifactStore, MemoryArtifactStore};
use runlens_tabs::{ArtifactStore, AthleteId, StoreError};

#[test]
fn test_fs_store_round_trip_and_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    store.save(AthleteId(9), "personal_bests", "table.json", b"{}").unwrap();

    assert_eq!(store.load(AthleteId(9), "personal_bests", "table.json").unwrap(), b"{}");
    assert!(dir.path().join("9").join("personal_bests").join("table.json").is_file());
    assert!(store.exists(AthleteId(9), "personal_bests", "table.json"));
}

#[test]
fn test_fs_store_missing_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    let err = store.load(AthleteId(1), "cumulative_time", "chart.json").unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(!store.exists(AthleteId(1), "cumulative_time", "chart.json"));
}

#[test]
fn test_fs_store_rejects_escaping_names() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path().join("artifacts"));
    let err = store.save(AthleteId(1), "..", "x", b"x").unwrap_err();
    assert!(matches!(err, StoreError::InvalidName(_)));
    let err = store.load(AthleteId(1), "key", "../../etc").unwrap_err();
    assert!(matches!(err, StoreError::InvalidName(_)));
}

#[test]
fn test_fs_store_overwrite_is_complete() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path());
    store.save(AthleteId(1), "k", "chart.json", b"old payload").unwrap();
    store.save(AthleteId(1), "k", "chart.json", b"new").unwrap();
    assert_eq!(store.load(AthleteId(1), "k", "chart.json").unwrap(), b"new");

    let files = std::fs::read_dir(dir.path().join("1").join("k")).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn test_memory_store_is_per_athlete() {
    let store = MemoryArtifactStore::new();
    store.save(AthleteId(1), "k", "chart.json", b"one").unwrap();
    assert!(store.load(AthleteId(2), "k", "chart.json").is_err());
    assert_eq!(store.load(AthleteId(1), "k", "chart.json").unwrap(), b"one");
    assert_eq!(store.len(), 1);
}
