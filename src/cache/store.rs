//! Key-value store abstraction backing the cache manager
//!
//! The store only sees opaque bytes. Expiry hints are advisory: a store that
//! ignores them is still correct because the manager checks `expires_at` on
//! every read.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// External key-value store: `GET`, `SET` with optional expiry, `DEL`
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key, with an expiry hint when the store supports one
    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    async fn del(&self, key: &str) -> Result<()>;
}

struct StoredValue {
    bytes: Vec<u8>,
    deadline: Option<Instant>,
}

/// In-process store used for single-instance deployments and tests
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
    honor_expiry: bool,
}

impl MemoryStore {
    /// Create a store that expires keys according to the hint passed to `set`
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            honor_expiry: true,
        }
    }

    /// Create a store that keeps keys until they are deleted
    pub fn without_expiry() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            honor_expiry: false,
        }
    }

    /// Number of keys currently held, including ones past their deadline
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store holds no keys
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Check whether a raw key is present (ignores deadlines)
    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;

        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(stored) => stored
                .deadline
                .map(|deadline| Instant::now() >= deadline)
                .unwrap_or(false),
        };

        if expired {
            debug!("Store key passed its deadline: {}", key);
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|stored| stored.bytes.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, expiry: Option<Duration>) -> Result<()> {
        let deadline = if self.honor_expiry {
            expiry.map(|ttl| Instant::now() + ttl)
        } else {
            None
        };

        self.entries.write().await.insert(
            key.to_string(),
            StoredValue {
                bytes: value,
                deadline,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
