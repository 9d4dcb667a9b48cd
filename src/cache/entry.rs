//! Serialized cache envelope with TTL bookkeeping

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// A cache entry as written to the key-value store
///
/// `expires_at` is always `created_at + category TTL`. The store may or may
/// not expire the key itself; reads check `expires_at` regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The full store key (category prefix + identifier)
    pub key: String,

    /// The cached payload
    pub payload: Value,

    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new entry written at `now` that lives for `ttl`
    pub fn new(key: String, payload: Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at =
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3600));

        Self {
            key,
            payload,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the entry has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Remaining lifetime at `now`, `None` once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired_at(now) {
            None
        } else {
            (self.expires_at - now).to_std().ok()
        }
    }

    /// Get the age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Encode for the store
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode bytes read from the store
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_entry_creation() {
        let now = Utc::now();
        let entry = CacheEntry::new(
            "sequences:ring42:gold".to_string(),
            json!({"frames": [1, 2, 3]}),
            now,
            Duration::from_secs(1800),
        );

        assert_eq!(entry.key, "sequences:ring42:gold");
        assert_eq!(entry.expires_at - entry.created_at, chrono::Duration::seconds(1800));
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let entry = CacheEntry::new("k".into(), json!(1), now, Duration::from_secs(10));

        assert!(!entry.is_expired_at(now + chrono::Duration::seconds(10)));
        assert!(entry.is_expired_at(now + chrono::Duration::seconds(11)));
        assert!(entry
            .time_until_expiration(now + chrono::Duration::seconds(11))
            .is_none());
        assert_eq!(
            entry.time_until_expiration(now + chrono::Duration::seconds(4)),
            Some(Duration::from_secs(6))
        );
    }

    #[test]
    fn test_age() {
        let now = Utc::now();
        let entry = CacheEntry::new("k".into(), json!(null), now, Duration::from_secs(60));
        assert_eq!(entry.age(now + chrono::Duration::seconds(5)), Duration::from_secs(5));
        // Clock skew backwards never yields a negative age
        assert_eq!(entry.age(now - chrono::Duration::seconds(5)), Duration::from_secs(0));
    }

    #[test]
    fn test_bytes_decode_rejects_garbage() {
        assert!(CacheEntry::from_bytes(b"not-json").is_err());
    }
}
