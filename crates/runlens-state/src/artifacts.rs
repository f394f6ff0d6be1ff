//! Artifact stores.
//!
//! `FsArtifactStore` lays artifacts out as `{root}/{athlete_id}/{key}/{name}`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use runlens_tabs::{ArtifactStore, AthleteId, StoreError};

use crate::persist::write_atomic;

/// Reject path segments that could escape the store root.
fn check_segment(segment: &str) -> Result<(), StoreError> {
    let bad = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.starts_with('.')
        || segment.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidName(segment.to_string()));
    }
    Ok(())
}

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<PathBuf, StoreError> {
        check_segment(key)?;
        check_segment(name)?;
        Ok(self.root.join(athlete_id.to_string()).join(key).join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, athlete_id: AthleteId, key: &str, name: &str, payload: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(athlete_id, key, name)?;
        write_atomic(&path, payload)?;
        tracing::trace!(path = %path.display(), bytes = payload.len(), "artifact saved");
        Ok(())
    }

    fn load(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(athlete_id, key, name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                athlete_id,
                key: key.to_string(),
                name: name.to_string(),
            },
            _ => StoreError::Io(e),
        })
    }

    fn exists(&self, athlete_id: AthleteId, key: &str, name: &str) -> bool {
        self.path_for(athlete_id, key, name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }
}

type ArtifactId = (AthleteId, String, String);

/// Artifact store kept entirely in memory.
#[derive(Default)]
pub struct MemoryArtifactStore {
    entries: Mutex<HashMap<ArtifactId, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn save(&self, athlete_id: AthleteId, key: &str, name: &str, payload: &[u8]) -> Result<(), StoreError> {
        check_segment(key)?;
        check_segment(name)?;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((athlete_id, key.to_string(), name.to_string()), payload.to_vec());
        Ok(())
    }

    fn load(&self, athlete_id: AthleteId, key: &str, name: &str) -> Result<Vec<u8>, StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(athlete_id, key.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                athlete_id,
                key: key.to_string(),
                name: name.to_string(),
            })
    }
}
