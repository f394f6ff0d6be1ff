//! RunLens Server - HTTP API and CLI wiring for the tab framework.
//!
//! - `catalogue`: the built-in tab forest
//! - `config`: TOML configuration with `RUNLENS_*` overrides
//! - `server`: axum router, tab routes, data status and processing endpoints
//! - `jobs`: background processing runs

pub mod catalogue;
pub mod config;
pub mod error;
pub mod jobs;
pub mod server;

pub use catalogue::default_forest;
pub use config::{ConfigError, HttpConfig, ServerConfig, StorageConfig};
pub use error::ApiError;
pub use jobs::run_processing;
pub use server::{build_router, run, session_token, TabRouteTable, WebState, SESSION_COOKIE};
