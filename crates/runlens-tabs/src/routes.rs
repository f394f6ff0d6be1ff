//! Route generation.
//!
//! Every leaf tab gets exactly one `GET /api/data/{key}` route. The route
//! table is injected, so the HTTP framework stays outside this crate.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{leaves, AthleteId, TabEnv, TabEnvelope, TabError, TabNode};

/// Handler behind a tab route. Receives the athlete resolved from the
/// request's session and always yields an envelope.
pub type DataHandler = Arc<dyn Fn(AthleteId) -> TabEnvelope + Send + Sync>;

/// Destination for generated routes.
pub trait RouteTable {
    fn register(&mut self, path: String, handler: DataHandler) -> Result<(), TabError>;
}

pub fn route_path(key: &str) -> String {
    format!("/api/data/{key}")
}

/// Register a route for every leaf tab in the forest.
///
/// Key uniqueness is checked for the whole forest before anything is
/// registered, so a collision leaves the route table untouched. Returns the
/// number of routes registered.
pub fn register_all(
    forest: &[TabNode],
    routes: &mut dyn RouteTable,
    env: Arc<TabEnv>,
) -> Result<usize, TabError> {
    let tabs = leaves(forest);

    let mut seen: HashMap<String, &str> = HashMap::new();
    for tab in &tabs {
        let key = tab.get_key();
        if let Some(previous) = seen.insert(key.clone(), tab.get_name()) {
            return Err(TabError::Configuration(format!(
                "tabs '{previous}' and '{}' both resolve to key '{key}'",
                tab.get_name()
            )));
        }
    }

    for tab in &tabs {
        Arc::clone(tab).generate_and_register_route(routes, Arc::clone(&env))?;
    }

    tracing::info!(routes = tabs.len(), "registered tab routes");
    Ok(tabs.len())
}

/// In-memory route table, keyed by path in registration order.
#[derive(Default)]
pub struct RecordingRouteTable {
    routes: Vec<(String, DataHandler)>,
}

impl RecordingRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.routes.iter().map(|(p, _)| p.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Invoke the handler registered at `path`, if any.
    pub fn call(&self, path: &str, athlete_id: AthleteId) -> Option<TabEnvelope> {
        self.routes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, handler)| handler(athlete_id))
    }
}

impl RouteTable for RecordingRouteTable {
    fn register(&mut self, path: String, handler: DataHandler) -> Result<(), TabError> {
        if self.routes.iter().any(|(p, _)| *p == path) {
            return Err(TabError::Configuration(format!("route {path} registered twice")));
        }
        self.routes.push((path, handler));
        Ok(())
    }
}
