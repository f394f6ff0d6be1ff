mod support;

use std::sync::Arc;

use runlens_tabs::*;
use support::*;

#[test]
fn test_key_derived_from_name_is_stable() {
    let tab = count_plot("Personal Bests");
    assert_eq!(tab.get_key(), "personal_bests");
    assert_eq!(tab.get_key(), tab.get_key());
    assert_eq!(tab.get_name(), "Personal Bests");
}

#[test]
fn test_explicit_key_overrides_name() {
    let tab = count_plot("Personal Bests").with_key("pbs");
    assert_eq!(tab.get_key(), "pbs");
}

#[test]
fn test_variant_types() {
    assert_eq!(count_plot("a").get_type(), "plot_tab");
    assert_eq!(names_table("b").get_type(), "table_tab");
    let image = ImageTab::new("c", false, "", |_, _| Ok(()));
    assert_eq!(image.get_type(), "image_tab");
}

#[test]
fn test_personal_bests_route_path() {
    let dir = tempfile::tempdir().unwrap();
    let env = Arc::new(env_with(Arc::new(MemStore::default()), dir.path()));
    let forest = vec![TabNode::tab(names_table("Personal Bests"))];

    let mut routes = RecordingRouteTable::new();
    let count = register_all(&forest, &mut routes, env).unwrap();

    assert_eq!(count, 1);
    assert_eq!(routes.paths(), vec!["/api/data/personal_bests"]);
}

#[test]
fn test_retrieve_before_processing_is_failure_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let env = Arc::new(env_with(Arc::new(MemStore::default()), dir.path()));
    let forest = vec![TabNode::tab(count_plot("Cumulative Time"))];

    let mut routes = RecordingRouteTable::new();
    register_all(&forest, &mut routes, env).unwrap();

    let envelope = routes
        .call("/api/data/cumulative_time", AthleteId(1))
        .expect("route registered");
    assert_eq!(envelope.status, EnvelopeStatus::Failure);
    assert_eq!(envelope.key, "cumulative_time");
    assert_eq!(envelope.tab_type, "plot_tab");
    assert!(envelope.tab_data.is_none());
}

#[test]
fn test_not_yet_available_error_from_hook() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_with(Arc::new(MemStore::default()), dir.path());
    let tab = names_table("Recent");
    let err = tab.retrieve_frontend_data(&env, AthleteId(3)).unwrap_err();
    assert!(matches!(err, TabError::NotYetAvailable { ref key } if key == "recent"));
}

#[test]
fn test_processed_plot_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemStore::default());
    let env = Arc::new(env_with(store.clone(), dir.path()));
    let tab = count_plot("Count");

    tab.backend_processing_hook(&runs(), &env, AthleteId(1)).unwrap();
    assert_eq!(store.names(AthleteId(1), "count"), vec!["chart.json"]);

    let envelope = tab.frontend_envelope(&env, AthleteId(1));
    assert!(envelope.is_success());
    let data = envelope.tab_data.unwrap();
    assert_eq!(data["data"][0]["y"][0], 2.0);

    // Other athletes still see nothing.
    assert!(!tab.frontend_envelope(&env, AthleteId(2)).is_success());
}

#[test]
fn test_failing_plot_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemStore::default());
    let env = env_with(store.clone(), dir.path());
    let tab = PlotTab::new("Broken", false, "", |_| anyhow::bail!("no data"));

    let err = tab.backend_processing_hook(&runs(), &env, AthleteId(1)).unwrap_err();
    assert!(matches!(err, TabError::GenerationFailed { .. }));
    assert!(err.to_string().contains("no data"));
    assert!(store.names(AthleteId(1), "broken").is_empty());
}

struct PanickyTab {
    meta: TabMeta,
}

impl Tab for PanickyTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn get_type(&self) -> &'static str {
        "plot_tab"
    }

    fn description(&self) -> &str {
        ""
    }

    fn retrieve_frontend_data(&self, _env: &TabEnv, _athlete_id: AthleteId) -> Result<serde_json::Value, TabError> {
        panic!("corrupt artifact")
    }

    fn backend_processing_hook(&self, _: &[Activity], _: &TabEnv, _: AthleteId) -> Result<(), TabError> {
        Ok(())
    }
}

#[test]
fn test_panicking_hook_becomes_failure_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_with(Arc::new(MemStore::default()), dir.path());
    let tab = PanickyTab { meta: TabMeta::new("Panicky", false) };
    let envelope = tab.frontend_envelope(&env, AthleteId(1));
    assert_eq!(envelope.status, EnvelopeStatus::Failure);
}
