//! Download-status table: `athlete_id -> DownloadStatus`.
//!
//! The frontend polls this (via `/api/data_status` or the websocket) while
//! activities are downloaded and tabs are processed.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use runlens_tabs::{AthleteId, StoreError};

use crate::persist::JsonTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    Downloading,
    Processing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadStatus {
    pub athlete_id: AthleteId,
    pub state: DownloadState,
    #[serde(default)]
    pub detail: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Time of the last download that completed.
    #[serde(default)]
    pub last_download_time: Option<DateTime<Utc>>,
}

/// Body of `GET /api/data_status` and of each websocket message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStatus {
    pub message: String,
    pub stop_polling: bool,
}

pub fn data_status_message(status: Option<&DownloadStatus>) -> DataStatus {
    let Some(status) = status else {
        return DataStatus {
            message: "No data downloaded yet.".into(),
            stop_polling: false,
        };
    };

    match status.state {
        DownloadState::Downloading => DataStatus {
            message: "Downloading activities...".into(),
            stop_polling: false,
        },
        DownloadState::Processing => DataStatus {
            message: "Processing activities...".into(),
            stop_polling: false,
        },
        DownloadState::Ready => {
            let when = status.last_download_time.unwrap_or(status.updated_at);
            let mut message = format!("Data last downloaded at {}.", when.format("%Y-%m-%d %H:%M UTC"));
            if let Some(detail) = &status.detail {
                message.push(' ');
                message.push_str(detail);
            }
            DataStatus {
                message,
                stop_polling: true,
            }
        }
        DownloadState::Failed => DataStatus {
            message: format!(
                "Download failed: {}",
                status.detail.as_deref().unwrap_or("unknown error")
            ),
            stop_polling: true,
        },
    }
}

pub struct DownloadStatusTable {
    table: JsonTable<AthleteId, DownloadStatus>,
}

fn athlete_of(status: &DownloadStatus) -> AthleteId {
    status.athlete_id
}

impl DownloadStatusTable {
    pub fn in_memory() -> Self {
        Self {
            table: JsonTable::in_memory(athlete_of),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            table: JsonTable::open(path, athlete_of)?,
        })
    }

    /// Record a state transition. Moving to `Ready` stamps the download time.
    pub fn set_state(
        &self,
        athlete_id: AthleteId,
        state: DownloadState,
        detail: Option<String>,
    ) -> Result<DownloadStatus, StoreError> {
        let now = Utc::now();
        let status = self.table.update(&athlete_id, |previous| DownloadStatus {
            athlete_id,
            state,
            detail,
            updated_at: now,
            last_download_time: if state == DownloadState::Ready {
                Some(now)
            } else {
                previous.and_then(|p| p.last_download_time)
            },
        })?;
        tracing::debug!(athlete = %athlete_id, state = ?state, "download status updated");
        Ok(status)
    }

    pub fn get(&self, athlete_id: AthleteId) -> Option<DownloadStatus> {
        self.table.get(&athlete_id)
    }

    pub fn last_download_time(&self, athlete_id: AthleteId) -> Option<DateTime<Utc>> {
        self.get(athlete_id).and_then(|s| s.last_download_time)
    }

    pub fn data_status(&self, athlete_id: AthleteId) -> DataStatus {
        data_status_message(self.get(athlete_id).as_ref())
    }
}
