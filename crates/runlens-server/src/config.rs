//! Server configuration, loaded from TOML with environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
        }
    }
}

/// Where tables, artifacts and downloaded activities live. Every path not
/// set explicitly is derived from `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activities_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            artifacts_dir: None,
            scratch_dir: None,
            activities_dir: None,
            sessions_file: None,
            status_file: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("runlens"))
        .unwrap_or_else(|| PathBuf::from("./runlens-data"))
}

impl StorageConfig {
    fn resolve(&self, explicit: &Option<PathBuf>, default_name: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| self.data_dir.join(default_name))
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.resolve(&self.artifacts_dir, "artifacts")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.resolve(&self.scratch_dir, "scratch")
    }

    pub fn activities_dir(&self) -> PathBuf {
        self.resolve(&self.activities_dir, "activities")
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.resolve(&self.sessions_file, "sessions.json")
    }

    pub fn status_file(&self) -> PathBuf {
        self.resolve(&self.status_file, "download_status.json")
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    /// Environment overrides are applied in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "loaded config file");
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `RUNLENS_*` overrides using `lookup` to read variables.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("RUNLENS_BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            self.server.bind_addr = addr.trim().to_string();
        }
        if let Some(dir) = lookup("RUNLENS_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.storage.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(domain) = lookup("RUNLENS_DOMAIN").filter(|v| !v.trim().is_empty()) {
            let domain = domain.trim().to_string();
            if !self.server.allowed_origins.contains(&domain) {
                self.server.allowed_origins.push(domain);
            }
        }
    }
}
