//! Background processing runs.

use std::panic::{catch_unwind, AssertUnwindSafe};

use runlens_state::{DownloadState, DownloadStatusTable};
use runlens_tabs::{
    fetch_activity_sets, run_hooks, ActivitySource, AthleteId, ProcessingReport, TabEnv, TabError,
    TabNode,
};

/// Fetch activities and run every tab's backend hook for one athlete,
/// recording progress in the download-status table.
///
/// Individual tab failures are reported in the returned report and do not
/// fail the run; only a failing (or panicking) activity source does.
pub fn run_processing(
    forest: &[TabNode],
    source: &dyn ActivitySource,
    env: &TabEnv,
    statuses: &DownloadStatusTable,
    athlete_id: AthleteId,
) -> Result<ProcessingReport, TabError> {
    statuses.set_state(athlete_id, DownloadState::Downloading, None)?;

    let fetched = catch_unwind(AssertUnwindSafe(|| fetch_activity_sets(forest, source, athlete_id)))
        .unwrap_or_else(|_| Err(TabError::Source("activity source panicked".to_string())));
    let sets = match fetched {
        Ok(sets) => sets,
        Err(e) => {
            statuses.set_state(athlete_id, DownloadState::Failed, Some(e.to_string()))?;
            return Err(e);
        }
    };

    statuses.set_state(athlete_id, DownloadState::Processing, None)?;
    let report = run_hooks(forest, &sets, env, athlete_id);

    let detail = (!report.is_complete()).then(|| {
        format!(
            "{} of {} tabs failed to update.",
            report.failed.len(),
            report.total()
        )
    });
    statuses.set_state(athlete_id, DownloadState::Ready, detail)?;
    Ok(report)
}
