//! # Tiered Cache
//!
//! Category-scoped, TTL-bounded memoization over an external key-value store.
//!
//! ## Features
//!
//! - **Fixed TTL policy**: variants 900s, materials 3600s, sequences 1800s,
//!   popular bundles 7200s
//! - **Lazy expiry**: an entry read after `expires_at` is a miss and is deleted,
//!   even if the store never expired it
//! - **Expiry hints**: the TTL is also passed to the store when it supports one
//! - **Never fails a request**: store and decode errors degrade to misses,
//!   population errors are logged and dropped
//!
//! ## Example
//!
//! ```rust
//! use configurator_assets::cache::{CacheCategory, MemoryStore, TieredCacheManager};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let cache = TieredCacheManager::new(Arc::new(MemoryStore::new()));
//!
//! cache
//!     .put(CacheCategory::Sequences, "ring42:gold", json!({"frames": [1, 2, 3]}))
//!     .await;
//!
//! if let Some(value) = cache.get(CacheCategory::Sequences, "ring42:gold").await {
//!     println!("Cache hit: {}", value);
//! }
//! # }
//! ```

pub mod category;
pub mod entry;
pub mod manager;
pub mod store;
pub mod types;

pub use category::{CacheCategory, CategoryConfig};
pub use entry::CacheEntry;
pub use manager::{TieredCacheManager, WarmEntry, WarmSummary};
pub use store::{KeyValueStore, MemoryStore};
pub use types::CacheStats;
