use thiserror::Error;

use crate::AthleteId;

/// Errors raised by artifact stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("artifact '{name}' for tab '{key}' (athlete {athlete_id}) not found")]
    NotFound {
        athlete_id: AthleteId,
        key: String,
        name: String,
    },

    #[error("invalid artifact path segment: '{0}'")]
    InvalidName(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by tabs, the route generator and the processing driver.
#[derive(Error, Debug)]
pub enum TabError {
    /// The backend artifact for this tab has not been computed yet.
    #[error("data for tab '{key}' is not yet available")]
    NotYetAvailable { key: String },

    /// A transform failed while generating a tab's artifact.
    #[error("generating tab '{key}' failed: {reason}")]
    GenerationFailed { key: String, reason: String },

    /// The tab tree is misconfigured (e.g. two tabs share a key).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("activity source error: {0}")]
    Source(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TabError {
    pub(crate) fn generation(key: &str, err: &anyhow::Error) -> Self {
        TabError::GenerationFailed {
            key: key.to_string(),
            reason: format!("{err:#}"),
        }
    }
}
