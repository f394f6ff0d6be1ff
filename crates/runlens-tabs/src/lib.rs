//! RunLens Tabs - the tab framework behind the analytics API.
//!
//! A tab is a named, keyed unit of data shown by the frontend. Every tab
//! has two lifecycle hooks:
//! - a backend processing hook that turns raw activities into a stored artifact
//! - a frontend data hook that reads the artifact back for a UI request
//!
//! Tabs are arranged into a tree of [`TabGroup`]s. The route generator walks
//! the tree and registers one `GET /api/data/{key}` endpoint per leaf tab.

pub mod activity;
pub mod env;
pub mod error;
pub mod group;
pub mod image;
pub mod plot;
pub mod processing;
pub mod routes;
pub mod tab;
pub mod table;

pub use activity::*;
pub use env::*;
pub use error::*;
pub use group::{leaves, tab_tree, TabEntry, TabGroup, TabNode, GROUP_TYPE};
pub use image::{ImageTab, IMAGE_MANIFEST, IMAGE_TAB_TYPE};
pub use plot::{AxisValue, Figure, PlotTab, Trace, CHART_ARTIFACT, PLOT_TAB_TYPE};
pub use processing::{fetch_activity_sets, process_athlete, run_hooks, ActivitySets, ProcessingReport};
pub use routes::{register_all, route_path, DataHandler, RecordingRouteTable, RouteTable};
pub use tab::{derive_key, EnvelopeStatus, Tab, TabEnvelope, TabMeta};
pub use table::{
    Cell, ColumnSpec, ColumnType, LinkCell, Table, TableData, TableTab, TABLE_ARTIFACT, TABLE_TAB_TYPE,
};
