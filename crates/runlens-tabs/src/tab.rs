//! The tab capability contract.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routes::{route_path, DataHandler, RouteTable};
use crate::{Activity, AthleteId, TabEnv, TabError};

/// Derive a URL key from a display name: lowercase, spaces to underscores.
/// Punctuation and non-ASCII characters pass through unchanged.
pub fn derive_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Identity shared by every tab variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabMeta {
    pub name: String,
    /// Explicit key override; when `None` the key is derived from `name`.
    pub key: Option<String>,
    /// Whether the tab needs detailed (rather than summary) activities.
    pub detailed: bool,
}

impl TabMeta {
    pub fn new(name: &str, detailed: bool) -> Self {
        Self {
            name: name.to_string(),
            key: None,
            detailed,
        }
    }

    pub fn key(&self) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => derive_key(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStatus {
    Success,
    Failure,
}

/// Response body of `GET /api/data/{key}`.
///
/// Always returned with HTTP 200; failures are reported in `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEnvelope {
    pub key: String,
    #[serde(rename = "type")]
    pub tab_type: String,
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_data: Option<Value>,
}

impl TabEnvelope {
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}

/// A renderable, processable unit exposed to the frontend as one route.
///
/// Implementors provide identity through [`Tab::meta`] plus the variant
/// specific type, description and the two hooks. Tabs are built once at
/// startup and shared immutably between request handlers.
pub trait Tab: Send + Sync + 'static {
    fn meta(&self) -> &TabMeta;

    /// Fixed discriminator the frontend uses to choose a renderer.
    fn get_type(&self) -> &'static str;

    fn description(&self) -> &str;

    /// Read path: produce the payload served to a UI request.
    fn retrieve_frontend_data(&self, env: &TabEnv, athlete_id: AthleteId)
        -> Result<Value, TabError>;

    /// Write path: compute and persist this tab's artifact.
    ///
    /// On error no partially written artifact may become visible.
    fn backend_processing_hook(
        &self,
        activities: &[Activity],
        env: &TabEnv,
        athlete_id: AthleteId,
    ) -> Result<(), TabError>;

    fn get_name(&self) -> &str {
        &self.meta().name
    }

    fn get_key(&self) -> String {
        self.meta().key()
    }

    fn is_detailed(&self) -> bool {
        self.meta().detailed
    }

    /// Run the frontend hook and wrap the outcome in an envelope.
    ///
    /// Errors (and panics) from the hook are logged and reported as a
    /// `Failure` envelope; they never escape.
    fn frontend_envelope(&self, env: &TabEnv, athlete_id: AthleteId) -> TabEnvelope {
        let key = self.get_key();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.retrieve_frontend_data(env, athlete_id)
        }));

        let (status, tab_data) = match outcome {
            Ok(Ok(data)) => (EnvelopeStatus::Success, Some(data)),
            Ok(Err(TabError::NotYetAvailable { .. })) => {
                tracing::debug!(key = %key, athlete = %athlete_id, "tab data not yet available");
                (EnvelopeStatus::Failure, None)
            }
            Ok(Err(e)) => {
                tracing::warn!(key = %key, athlete = %athlete_id, error = %e, "frontend data retrieval failed");
                (EnvelopeStatus::Failure, None)
            }
            Err(_) => {
                tracing::error!(key = %key, athlete = %athlete_id, "frontend data retrieval panicked");
                (EnvelopeStatus::Failure, None)
            }
        };

        TabEnvelope {
            key,
            tab_type: self.get_type().to_string(),
            status,
            tab_data,
        }
    }

    /// Register this tab's `GET /api/data/{key}` route.
    fn generate_and_register_route(
        self: Arc<Self>,
        routes: &mut dyn RouteTable,
        env: Arc<TabEnv>,
    ) -> Result<(), TabError> {
        let path = route_path(&self.get_key());
        let tab = Arc::clone(&self);
        let handler: DataHandler =
            Arc::new(move |athlete_id: AthleteId| tab.frontend_envelope(&env, athlete_id));
        routes.register(path.clone(), handler)?;
        tracing::debug!(path = %path, tab_type = self.get_type(), "registered tab route");
        Ok(())
    }
}
