use chrono::{TimeZone, Utc};
use runlens_state::FsActivitySource;
use runlens_tabs::{Activity, ActivitySource, AthleteId, TabError};

fn run(id: u64, metres: f64) -> Activity {
    Activity::new(id, "Run", "Run", Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap())
        .with_distance(metres)
}

#[test]
fn test_unknown_athlete_has_no_activities() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsActivitySource::new(dir.path());
    assert!(source.fetch_activities(AthleteId(1), false).unwrap().is_empty());
    assert!(source.fetch_activities(AthleteId(1), true).unwrap().is_empty());
}

#[test]
fn test_detail_levels_are_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsActivitySource::new(dir.path());
    source.save_activities(AthleteId(1), false, &[run(1, 5000.0)]).unwrap();
    source
        .save_activities(AthleteId(1), true, &[run(1, 5000.0), run(2, 8000.0)])
        .unwrap();

    assert_eq!(source.fetch_activities(AthleteId(1), false).unwrap().len(), 1);
    assert_eq!(source.fetch_activities(AthleteId(1), true).unwrap().len(), 2);
}

#[test]
fn test_detailed_falls_back_to_summary() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsActivitySource::new(dir.path());
    source.save_activities(AthleteId(4), false, &[run(10, 3000.0)]).unwrap();

    let detailed = source.fetch_activities(AthleteId(4), true).unwrap();
    assert_eq!(detailed.len(), 1);
    assert_eq!(detailed[0].id, 10);
}

#[test]
fn test_corrupt_file_is_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let athlete_dir = dir.path().join("2");
    std::fs::create_dir_all(&athlete_dir).unwrap();
    std::fs::write(athlete_dir.join("summary.json"), b"not json").unwrap();

    let source = FsActivitySource::new(dir.path());
    let err = source.fetch_activities(AthleteId(2), false).unwrap_err();
    assert!(matches!(err, TabError::Source(_)));
}
