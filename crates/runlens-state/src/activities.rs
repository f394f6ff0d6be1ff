//! Filesystem activity source.
//!
//! Activities downloaded from the tracking API are stored per athlete as
//! `{root}/{athlete_id}/summary.json` and `{root}/{athlete_id}/detailed.json`.

use std::fs;
use std::path::{Path, PathBuf};

use runlens_tabs::{Activity, ActivitySource, AthleteId, StoreError, TabError};

use crate::persist::write_atomic;

pub struct FsActivitySource {
    root: PathBuf,
}

impl FsActivitySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, athlete_id: AthleteId, detailed: bool) -> PathBuf {
        let name = if detailed { "detailed.json" } else { "summary.json" };
        self.root.join(athlete_id.to_string()).join(name)
    }

    /// Store a downloaded activity list, replacing any previous one.
    pub fn save_activities(
        &self,
        athlete_id: AthleteId,
        detailed: bool,
        activities: &[Activity],
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(activities)?;
        write_atomic(&self.file_for(athlete_id, detailed), &bytes)?;
        tracing::debug!(athlete = %athlete_id, detailed, count = activities.len(), "saved activities");
        Ok(())
    }

    fn read_file(path: &Path) -> Result<Vec<Activity>, TabError> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TabError::Source(format!("{}: {e}", path.display())))
    }
}

impl ActivitySource for FsActivitySource {
    /// Detailed requests fall back to the summary file; an athlete with no
    /// files has no activities.
    fn fetch_activities(&self, athlete_id: AthleteId, detailed: bool) -> Result<Vec<Activity>, TabError> {
        let primary = self.file_for(athlete_id, detailed);
        if primary.is_file() {
            return Self::read_file(&primary);
        }
        let summary = self.file_for(athlete_id, false);
        if detailed && summary.is_file() {
            tracing::debug!(athlete = %athlete_id, "no detailed activities, using summary");
            return Self::read_file(&summary);
        }
        Ok(Vec::new())
    }
}
