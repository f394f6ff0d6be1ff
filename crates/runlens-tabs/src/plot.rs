//! Chart tabs.
//!
//! A [`PlotTab`] turns activities into a plotly-compatible [`Figure`]. The
//! backend hook stores the figure as `chart.json`; the frontend hook returns
//! it parsed. Date/time axis values are serialized as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Activity, AthleteId, Tab, TabEnv, TabError, TabMeta};

pub const PLOT_TAB_TYPE: &str = "plot_tab";
pub const CHART_ARTIFACT: &str = "chart.json";

/// A single value on a chart axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisValue {
    Number(f64),
    DateTime(DateTime<Utc>),
    Text(String),
}

impl From<f64> for AxisValue {
    fn from(v: f64) -> Self {
        AxisValue::Number(v)
    }
}

impl From<DateTime<Utc>> for AxisValue {
    fn from(v: DateTime<Utc>) -> Self {
        AxisValue::DateTime(v)
    }
}

impl From<&str> for AxisValue {
    fn from(v: &str) -> Self {
        AxisValue::Text(v.to_string())
    }
}

impl From<String> for AxisValue {
    fn from(v: String) -> Self {
        AxisValue::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: String,
    pub name: String,
    pub x: Vec<AxisValue>,
    pub y: Vec<AxisValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Trace {
    /// A line trace.
    pub fn line(name: &str, x: Vec<AxisValue>, y: Vec<AxisValue>) -> Self {
        Self {
            trace_type: "scatter".into(),
            name: name.to_string(),
            x,
            y,
            mode: Some("lines".into()),
        }
    }

    pub fn bar(name: &str, x: Vec<AxisValue>, y: Vec<AxisValue>) -> Self {
        Self {
            trace_type: "bar".into(),
            name: name.to_string(),
            x,
            y,
            mode: None,
        }
    }
}

/// Plotly figure: a list of traces plus a free-form layout object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl Figure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.data.push(trace);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.layout
            .insert("title".into(), serde_json::json!({ "text": title }));
        self
    }

    pub fn with_axis_titles(mut self, x: &str, y: &str) -> Self {
        self.layout
            .insert("xaxis".into(), serde_json::json!({ "title": { "text": x } }));
        self.layout
            .insert("yaxis".into(), serde_json::json!({ "title": { "text": y } }));
        self
    }
}

pub type FigureFn = Box<dyn Fn(&[Activity]) -> anyhow::Result<Figure> + Send + Sync>;

pub struct PlotTab {
    meta: TabMeta,
    description: String,
    plot_function: FigureFn,
}

impl PlotTab {
    pub fn new<F>(name: &str, detailed: bool, description: &str, plot_function: F) -> Self
    where
        F: Fn(&[Activity]) -> anyhow::Result<Figure> + Send + Sync + 'static,
    {
        Self {
            meta: TabMeta::new(name, detailed),
            description: description.to_string(),
            plot_function: Box::new(plot_function),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.meta.key = Some(key.to_string());
        self
    }

    /// Run the transform and return the figure as a JSON value.
    pub fn get_chart_value(&self, activities: &[Activity]) -> Result<Value, TabError> {
        let figure = (self.plot_function)(activities)
            .map_err(|e| TabError::generation(&self.get_key(), &e))?;
        Ok(serde_json::to_value(&figure)?)
    }
}

impl Tab for PlotTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn get_type(&self) -> &'static str {
        PLOT_TAB_TYPE
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn retrieve_frontend_data(&self, env: &TabEnv, athlete_id: AthleteId) -> Result<Value, TabError> {
        let bytes = env.load_artifact(athlete_id, &self.get_key(), CHART_ARTIFACT)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn backend_processing_hook(
        &self,
        activities: &[Activity],
        env: &TabEnv,
        athlete_id: AthleteId,
    ) -> Result<(), TabError> {
        let chart = self.get_chart_value(activities)?;
        let bytes = serde_json::to_vec(&chart)?;
        env.artifacts
            .save(athlete_id, &self.get_key(), CHART_ARTIFACT, &bytes)?;
        tracing::debug!(key = %self.get_key(), athlete = %athlete_id, bytes = bytes.len(), "saved chart");
        Ok(())
    }
}
