//! services/practice/src/adapters/memory_store.rs
//!
//! An in-process implementation of the `KeyValueStore` port. It behaves like
//! browser local storage, including an optional byte quota that rejects
//! writes once the total size of keys and values would exceed it.

use async_trait::async_trait;
use dental_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::HashMap;
use tokio::sync::RwLock;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that refuses writes beyond `quota_bytes` in total.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self.entries.write().await;

        if let Some(limit) = self.quota_bytes {
            let current: usize = entries.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = entries.get(key).map(|v| entry_size(key, v)).unwrap_or(0);
            let needed = current - replaced + entry_size(key, value);
            if needed > limit {
                return Err(PortError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn usage_bytes(&self) -> PortResult<usize> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| entry_size(k, v))
            .sum())
    }
}
