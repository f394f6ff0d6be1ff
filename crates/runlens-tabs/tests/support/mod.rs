//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use runlens_tabs::*;

#[derive(Default)]
pub struct MemStore {
    entries: Mutex<HashMap<(AthleteId, String, String), Vec<u8>>>,
}

impl MemStore {
    pub fn names(&self, athlete_id: AthleteId, key: &str) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        let mut names: Vec<String> = entries
            .keys()
            .filter(|(a, k, _)| *a == athlete_id && k == key)
            .map(|(_, _, n)| n.clone())
            .collect();
        names.sort();
        names
    }
}

impl ArtifactStore for MemStore {
    fn save(&self, athlete_id: AthleteId, key: &str, name: &str, payload: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert((athlete_id, key.to_string(), name.to_string()), payload.to_vec());
        Ok(())
    }

    fn load(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        self.entries
            .lock()
            .unwrap()
            .get(&(athlete_id, key.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                athlete_id,
                key: key.to_string(),
                name: name.to_string(),
            })
    }
}

/// Store whose `fail_on`-th save (counting from 1) fails with an I/O error.
pub struct FlakyStore {
    pub inner: MemStore,
    saves: AtomicUsize,
    fail_on: usize,
}

impl FlakyStore {
    pub fn failing_on(fail_on: usize) -> Self {
        Self { inner: MemStore::default(), saves: AtomicUsize::new(0), fail_on }
    }
}

impl ArtifactStore for FlakyStore {
    fn save(&self, athlete_id: AthleteId, key: &str, name: &str, payload: &[u8]) -> Result<(), StoreError> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk full")));
        }
        self.inner.save(athlete_id, key, name, payload)
    }

    fn load(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        self.inner.load(athlete_id, key, name)
    }
}

/// Activity source returning fixed lists, counting calls per detail level.
pub struct StaticSource {
    pub activities: Vec<Activity>,
    pub calls: Mutex<Vec<bool>>,
    pub fail: bool,
}

impl StaticSource {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities, calls: Mutex::new(Vec::new()), fail: false }
    }
}

impl ActivitySource for StaticSource {
    fn fetch_activities(&self, _athlete_id: AthleteId, detailed: bool) -> Result<Vec<Activity>, TabError> {
        self.calls.lock().unwrap().push(detailed);
        if self.fail {
            return Err(TabError::Source("tracking API unavailable".into()));
        }
        Ok(self.activities.clone())
    }
}

pub fn env_with(store: Arc<MemStore>, scratch: &Path) -> TabEnv {
    TabEnv::new(store, scratch)
}

pub fn runs() -> Vec<Activity> {
    vec![
        Activity::new(1, "Morning Run", "Run", Utc.with_ymd_and_hms(2024, 1, 5, 7, 0, 0).unwrap())
            .with_distance(5000.0)
            .with_moving_time(1500),
        Activity::new(2, "Long Run", "Run", Utc.with_ymd_and_hms(2024, 1, 7, 8, 30, 0).unwrap())
            .with_distance(21100.0)
            .with_moving_time(6900),
    ]
}

pub fn count_plot(name: &str) -> PlotTab {
    PlotTab::new(name, false, "activity count", |activities| {
        Ok(Figure::new().with_trace(Trace::line(
            "count",
            vec![AxisValue::Text("all".into())],
            vec![AxisValue::Number(activities.len() as f64)],
        )))
    })
}

pub fn names_table(name: &str) -> TableTab {
    TableTab::new(name, false, "activity names", |activities| {
        Ok(Table::new().with_column(
            "Name",
            activities.iter().map(|a| Cell::text(a.name.clone())).collect(),
        ))
    })
}
