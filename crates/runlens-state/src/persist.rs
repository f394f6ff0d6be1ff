//! JSON-file backed tables and atomic file writes.

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use runlens_tabs::StoreError;

/// Write `bytes` to `path` via a sibling temp file and rename, so readers
/// see either the old file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// A keyed table held in memory and optionally mirrored to a JSON file.
///
/// The file holds a JSON array of rows sorted by key.
pub struct JsonTable<K, V> {
    path: Option<PathBuf>,
    rows: RwLock<HashMap<K, V>>,
    key_of: fn(&V) -> K,
}

impl<K, V> JsonTable<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Serialize + DeserializeOwned + Clone,
{
    pub fn in_memory(key_of: fn(&V) -> K) -> Self {
        Self {
            path: None,
            rows: RwLock::new(HashMap::new()),
            key_of,
        }
    }

    /// Open a file-backed table; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>, key_of: fn(&V) -> K) -> Result<Self, StoreError> {
        let path = path.into();
        let rows = if path.exists() {
            let list: Vec<V> = serde_json::from_slice(&fs::read(&path)?)?;
            list.into_iter().map(|row| (key_of(&row), row)).collect()
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), rows = rows.len(), "opened table");
        Ok(Self {
            path: Some(path),
            rows: RwLock::new(rows),
            key_of,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, V>> {
        self.rows.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, V>> {
        self.rows.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Insert or replace a row and persist the table.
    pub fn upsert(&self, row: V) -> Result<(), StoreError> {
        let mut rows = self.write();
        self.insert_and_flush(&mut rows, row)
    }

    /// Apply `f` to the row at `key` (or `None`) and store what it returns.
    pub fn update<F>(&self, key: &K, f: F) -> Result<V, StoreError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut rows = self.write();
        let row = f(rows.get(key));
        self.insert_and_flush(&mut rows, row.clone())?;
        Ok(row)
    }

    /// A failed flush rolls the in-memory row back.
    fn insert_and_flush(&self, rows: &mut HashMap<K, V>, row: V) -> Result<(), StoreError> {
        let key = (self.key_of)(&row);
        let previous = rows.insert(key.clone(), row);
        if let Err(e) = self.flush(rows) {
            match previous {
                Some(old) => rows.insert(key, old),
                None => rows.remove(&key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn flush(&self, rows: &HashMap<K, V>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut keys: Vec<&K> = rows.keys().collect();
        keys.sort();
        let list: Vec<&V> = keys.into_iter().filter_map(|k| rows.get(k)).collect();
        write_atomic(path, &serde_json::to_vec_pretty(&list)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("table.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "temp files must not remain");
    }

    #[test]
    fn test_table_persists_sorted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let table: JsonTable<u32, (u32, String)> = JsonTable::open(&path, |row: &(u32, String)| row.0).unwrap();
        table.upsert((2, "b".into())).unwrap();
        table.upsert((1, "a".into())).unwrap();
        table.upsert((2, "c".into())).unwrap();

        let reopened: JsonTable<u32, (u32, String)> = JsonTable::open(&path, |row: &(u32, String)| row.0).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get(&2), Some((2, "c".to_string())));
        let raw: Vec<(u32, String)> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw[0].0, 1);
    }
}
