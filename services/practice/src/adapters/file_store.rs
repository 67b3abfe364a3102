//! services/practice/src/adapters/file_store.rs
//!
//! A `KeyValueStore` adapter that keeps each key in its own `<key>.json` file
//! under a directory, so data survives restarts of the runner binary.
//! Writes go to a temporary file first and are renamed into place.

use async_trait::async_trait;
use dental_core::ports::{KeyValueStore, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const EXTENSION: &str = "json";

#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PortError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", key, EXTENSION)))
    }
}

fn storage_error(e: std::io::Error) -> PortError {
    PortError::Storage(e.to_string())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(storage_error)?;

        let tmp = self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        tokio::fs::write(&tmp, value).await.map_err(storage_error)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(storage_error(e));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }

    async fn usage_bytes(&self) -> PortResult<usize> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(storage_error(e)),
        };

        let mut total = 0;
        while let Some(entry) = dir.next_entry().await.map_err(storage_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let key_len = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::len)
                .unwrap_or(0);
            let metadata = entry.metadata().await.map_err(storage_error)?;
            total += key_len + metadata.len() as usize;
        }
        Ok(total)
    }
}
