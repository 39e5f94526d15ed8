//! Directory-backed store: one file per key.
//!
//! Writes go to a temp file in the same directory, are synced, then renamed
//! over the destination so a crash never leaves a half-written value.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use super::traits::KeyValueStore;
use crate::error::{Result, TapestryError};

/// Store keeping each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the store root. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !valid {
            return Err(TapestryError::InvalidInput(format!(
                "Storage key '{}' is not a safe file name",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(TapestryError::Storage(format!(
            "Failed to read {}: {}",
            path.display(),
            err
        ))),
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| TapestryError::Storage("Invalid store path".to_string()))?;
    fs::create_dir_all(parent).map_err(|e| {
        TapestryError::Storage(format!(
            "Failed to create store directory {}: {}",
            parent.display(),
            e
        ))
    })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| TapestryError::Storage(format!("System time error: {}", e)))?
        .as_nanos();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| TapestryError::Storage("Invalid store filename".to_string()))?;
    let temp_path = parent.join(format!(".{}.{}.tmp", filename, nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| TapestryError::Storage(format!("Temp file create failed: {}", e)))?;
    file.write_all(data)
        .map_err(|e| TapestryError::Storage(format!("Temp file write failed: {}", e)))?;
    file.sync_all()
        .map_err(|e| TapestryError::Storage(format!("Temp file sync failed: {}", e)))?;

    replace_file(&temp_path, path)
}

/// Rename `temp_path` over `destination`.
///
/// Some platforms refuse to rename onto an existing file; there the
/// destination is removed and the rename retried. The temp file is removed
/// if the value cannot be put in place.
fn replace_file(temp_path: &Path, destination: &Path) -> Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            TapestryError::Storage(format!(
                "Atomic rename failed (initial: {}, retry: {})",
                initial_err, retry_err
            ))
        })?;
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        tokio::task::spawn_blocking(move || read_optional(&path)).await?
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let data = value.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&path, &data)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("marq_tapestry_threads").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_round_trip_creates_directory() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("store"));

        store.set("marq_tapestry_threads", "[]").await.unwrap();
        store.set("marq_tapestry_threads", "[1]").await.unwrap();

        assert_eq!(
            store.get("marq_tapestry_threads").await.unwrap().as_deref(),
            Some("[1]")
        );
        let on_disk = fs::read_to_string(store.path_for("marq_tapestry_threads").unwrap()).unwrap();
        assert_eq!(on_disk, "[1]");
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("k", "v").await.unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["k.json".to_string()]);
    }

    #[test]
    fn test_unsafe_keys_rejected() {
        let store = FileStore::new("/tmp/unused");
        assert!(store.path_for("../escape").is_err());
        assert!(store.path_for("a/b").is_err());
        assert!(store.path_for("").is_err());
        assert!(store.path_for(".hidden").is_err());
        assert!(store.path_for("marq_profile").is_ok());
    }
}
