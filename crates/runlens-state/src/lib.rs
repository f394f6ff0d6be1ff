//! RunLens State - the key-value tables and stores behind the API.
//!
//! - `sessions`: session token -> athlete and OAuth tokens
//! - `download_status`: athlete -> download/processing progress
//! - `artifacts`: per-tab artifact stores (filesystem and in-memory)
//! - `activities`: filesystem activity source
//!
//! Tables are JSON files rewritten atomically on every change.

pub mod activities;
pub mod artifacts;
pub mod download_status;
pub mod persist;
pub mod sessions;

pub use activities::FsActivitySource;
pub use artifacts::{FsArtifactStore, MemoryArtifactStore};
pub use download_status::{data_status_message, DataStatus, DownloadState, DownloadStatus, DownloadStatusTable};
pub use sessions::{SessionTable, UserRecord};
