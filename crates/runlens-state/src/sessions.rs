//! Session table: `session_token -> UserRecord`.
//!
//! Rows are written by the OAuth callback (or the `session add` CLI command)
//! and read on every API request to identify the caller.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use runlens_tabs::{AthleteId, SessionResolver, StoreError, TabError};

use crate::persist::JsonTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub session_token: String,
    pub athlete_id: AthleteId,
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds at which `access_token` expires.
    pub expires_at: i64,
}

pub struct SessionTable {
    table: JsonTable<String, UserRecord>,
}

fn token_of(record: &UserRecord) -> String {
    record.session_token.clone()
}

impl SessionTable {
    pub fn in_memory() -> Self {
        Self {
            table: JsonTable::in_memory(token_of),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            table: JsonTable::open(path, token_of)?,
        })
    }

    pub fn upsert(&self, record: UserRecord) -> Result<(), StoreError> {
        let athlete_id = record.athlete_id;
        self.table.upsert(record)?;
        tracing::info!(athlete = %athlete_id, "stored session");
        Ok(())
    }

    pub fn get(&self, session_token: &str) -> Option<UserRecord> {
        self.table.get(&session_token.to_string())
    }

    pub fn athlete_for_token(&self, session_token: &str) -> Option<AthleteId> {
        self.get(session_token).map(|r| r.athlete_id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl SessionResolver for SessionTable {
    fn resolve(&self, session_token: &str) -> Result<AthleteId, TabError> {
        if session_token.is_empty() {
            return Err(TabError::Unauthorized);
        }
        self.athlete_for_token(session_token)
            .ok_or(TabError::Unauthorized)
    }
}
