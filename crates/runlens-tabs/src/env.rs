//! Collaborator contracts and the environment handed to tab hooks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{Activity, AthleteId, StoreError, TabError};

/// Persistent storage for per-tab artifacts, addressed by
/// `(athlete_id, tab key, artifact name)`.
///
/// `save` must make the artifact visible atomically: a reader sees either
/// the previous payload or the complete new one.
pub trait ArtifactStore: Send + Sync {
    fn save(
        &self,
        athlete_id: AthleteId,
        key: &str,
        name: &str,
        payload: &[u8],
    ) -> Result<(), StoreError>;

    /// Returns `StoreError::NotFound` when the artifact was never saved.
    fn load(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<Vec<u8>, StoreError>;

    fn exists(&self, athlete_id: AthleteId, key: &str, name: &str) -> bool {
        self.load(athlete_id, key, name).is_ok()
    }
}

/// Resolves a session token (from the request cookie) to an athlete.
pub trait SessionResolver: Send + Sync {
    /// Fails with [`TabError::Unauthorized`] when no valid session exists.
    fn resolve(&self, session_token: &str) -> Result<AthleteId, TabError>;
}

/// Supplies the downloaded activity history for an athlete.
pub trait ActivitySource: Send + Sync {
    fn fetch_activities(
        &self,
        athlete_id: AthleteId,
        detailed: bool,
    ) -> Result<Vec<Activity>, TabError>;
}

/// Everything a tab hook may touch outside its own state.
#[derive(Clone)]
pub struct TabEnv {
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Root under which image tabs create their per-invocation scratch dirs.
    pub scratch_root: PathBuf,
}

impl TabEnv {
    pub fn new(artifacts: Arc<dyn ArtifactStore>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            artifacts,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Load an artifact, treating a missing one as "not yet available".
    pub fn load_artifact(
        &self,
        athlete_id: AthleteId,
        key: &str,
        name: &str,
    ) -> Result<Vec<u8>, TabError> {
        match self.artifacts.load(athlete_id, key, name) {
            Ok(bytes) => Ok(bytes),
            Err(StoreError::NotFound { .. }) => Err(TabError::NotYetAvailable {
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
