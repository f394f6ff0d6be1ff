//! Background processing driver.
//!
//! Fetches an athlete's activities once per detail level and runs every leaf
//! tab's backend hook in tree order. A failing tab is recorded in the report
//! and never stops the remaining tabs.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::{leaves, Activity, ActivitySource, AthleteId, TabEnv, TabError, TabNode};

/// Activities fetched for one processing run.
#[derive(Debug, Clone, Default)]
pub struct ActivitySets {
    pub summary: Option<Vec<Activity>>,
    pub detailed: Option<Vec<Activity>>,
}

impl ActivitySets {
    pub fn for_detail(&self, detailed: bool) -> &[Activity] {
        let set = if detailed { &self.detailed } else { &self.summary };
        set.as_deref().unwrap_or(&[])
    }
}

/// Outcome of running all backend hooks for an athlete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    pub athlete_id: AthleteId,
    /// Keys of tabs whose artifact was stored.
    pub succeeded: Vec<String>,
    /// `(key, error message)` for tabs whose hook failed.
    pub failed: Vec<(String, String)>,
}

impl ProcessingReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Fetch only the activity sets some tab in the forest needs.
pub fn fetch_activity_sets(
    forest: &[TabNode],
    source: &dyn ActivitySource,
    athlete_id: AthleteId,
) -> Result<ActivitySets, TabError> {
    let tabs = leaves(forest);
    let mut sets = ActivitySets::default();

    if tabs.iter().any(|t| !t.is_detailed()) {
        sets.summary = Some(source.fetch_activities(athlete_id, false)?);
    }
    if tabs.iter().any(|t| t.is_detailed()) {
        sets.detailed = Some(source.fetch_activities(athlete_id, true)?);
    }

    tracing::debug!(
        athlete = %athlete_id,
        summary = ?sets.summary.as_ref().map(Vec::len),
        detailed = ?sets.detailed.as_ref().map(Vec::len),
        "fetched activities"
    );
    Ok(sets)
}

/// Run every leaf tab's backend hook against already fetched activities.
pub fn run_hooks(
    forest: &[TabNode],
    sets: &ActivitySets,
    env: &TabEnv,
    athlete_id: AthleteId,
) -> ProcessingReport {
    let mut report = ProcessingReport {
        athlete_id,
        succeeded: Vec::new(),
        failed: Vec::new(),
    };

    for tab in leaves(forest) {
        let key = tab.get_key();
        let activities = sets.for_detail(tab.is_detailed());
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            tab.backend_processing_hook(activities, env, athlete_id)
        }));
        match outcome {
            Ok(Ok(())) => report.succeeded.push(key),
            Ok(Err(e)) => {
                tracing::warn!(key = %key, athlete = %athlete_id, error = %e, "backend processing failed");
                report.failed.push((key, e.to_string()));
            }
            Err(_) => {
                tracing::error!(key = %key, athlete = %athlete_id, "backend processing panicked");
                report.failed.push((key, "backend processing panicked".to_string()));
            }
        }
    }

    tracing::info!(
        athlete = %athlete_id,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "backend processing finished"
    );
    report
}

/// Fetch activities and run all backend hooks for one athlete.
pub fn process_athlete(
    forest: &[TabNode],
    source: &dyn ActivitySource,
    env: &TabEnv,
    athlete_id: AthleteId,
) -> Result<ProcessingReport, TabError> {
    let sets = fetch_activity_sets(forest, source, athlete_id)?;
    Ok(run_hooks(forest, &sets, env, athlete_id))
}
