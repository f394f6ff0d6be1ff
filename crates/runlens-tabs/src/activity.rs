//! Activity records and athlete identity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an athlete on the fitness-tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AthleteId(pub u64);

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AthleteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AthleteId)
    }
}

impl From<u64> for AthleteId {
    fn from(id: u64) -> Self {
        AthleteId(id)
    }
}

/// A single workout as downloaded from the tracking service.
///
/// The tab framework never looks inside an activity; only tab transforms do.
/// Fields the service sends that are not modelled here are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sport_type: String,
    pub start_date: DateTime<Utc>,
    /// Metres.
    #[serde(default)]
    pub distance: f64,
    /// Seconds.
    #[serde(default)]
    pub moving_time: u64,
    /// Seconds.
    #[serde(default)]
    pub elapsed_time: u64,
    /// Metres.
    #[serde(default)]
    pub total_elevation_gain: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Activity {
    pub fn new(id: u64, name: &str, sport_type: &str, start_date: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.to_string(),
            sport_type: sport_type.to_string(),
            start_date,
            distance: 0.0,
            moving_time: 0,
            elapsed_time: 0,
            total_elevation_gain: 0.0,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_distance(mut self, metres: f64) -> Self {
        self.distance = metres;
        self
    }

    pub fn with_moving_time(mut self, secs: u64) -> Self {
        self.moving_time = secs;
        self.elapsed_time = self.elapsed_time.max(secs);
        self
    }
}
