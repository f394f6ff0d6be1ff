use std::sync::Arc;

use chrono::{TimeZone, Utc};

use runlens_server::{default_forest, run_processing};
use runlens_state::{DownloadState, DownloadStatusTable, MemoryArtifactStore};
use runlens_tabs::{Activity, ActivitySource, AthleteId, TabEnv, TabError};

struct PanickingSource;

impl ActivitySource for PanickingSource {
    fn fetch_activities(&self, _athlete_id: AthleteId, _detailed: bool) -> Result<Vec<Activity>, TabError> {
        panic!("activity cache corrupted")
    }
}

struct FailingSource;

impl ActivitySource for FailingSource {
    fn fetch_activities(&self, _athlete_id: AthleteId, _detailed: bool) -> Result<Vec<Activity>, TabError> {
        Err(TabError::Source("rate limited".into()))
    }
}

struct OneRun;

impl ActivitySource for OneRun {
    fn fetch_activities(&self, _athlete_id: AthleteId, _detailed: bool) -> Result<Vec<Activity>, TabError> {
        Ok(vec![Activity::new(
            1,
            "Morning Run",
            "Run",
            Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap(),
        )
        .with_distance(5000.0)
        .with_moving_time(1500)])
    }
}

fn env(dir: &std::path::Path) -> TabEnv {
    TabEnv::new(Arc::new(MemoryArtifactStore::new()), dir)
}

#[test]
fn test_panicking_source_marks_status_failed() {
    let dir = tempfile::tempdir().unwrap();
    let statuses = DownloadStatusTable::in_memory();

    let err = run_processing(&default_forest(), &PanickingSource, &env(dir.path()), &statuses, AthleteId(4))
        .unwrap_err();

    assert!(matches!(err, TabError::Source(_)));
    let status = statuses.get(AthleteId(4)).unwrap();
    assert_eq!(status.state, DownloadState::Failed);
    assert_eq!(status.detail.as_deref(), Some("activity source panicked"));
    assert!(statuses.data_status(AthleteId(4)).stop_polling);
}

#[test]
fn test_source_error_is_recorded_as_detail() {
    let dir = tempfile::tempdir().unwrap();
    let statuses = DownloadStatusTable::in_memory();

    run_processing(&default_forest(), &FailingSource, &env(dir.path()), &statuses, AthleteId(4)).unwrap_err();

    let status = statuses.get(AthleteId(4)).unwrap();
    assert_eq!(status.state, DownloadState::Failed);
    assert!(status.detail.unwrap().contains("rate limited"));
}

#[test]
fn test_successful_run_ends_ready() {
    let dir = tempfile::tempdir().unwrap();
    let statuses = DownloadStatusTable::in_memory();

    let report = run_processing(&default_forest(), &OneRun, &env(dir.path()), &statuses, AthleteId(4)).unwrap();

    assert!(report.is_complete(), "failed tabs: {:?}", report.failed);
    let status = statuses.get(AthleteId(4)).unwrap();
    assert_eq!(status.state, DownloadState::Ready);
    assert!(status.last_download_time.is_some());
}
