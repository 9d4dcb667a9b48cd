//! Statistics for the tiered cache

use serde::{Deserialize, Serialize};

/// Counters for cache activity since the manager was created
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that returned a live payload
    pub hits: u64,

    /// Reads that returned nothing (absent, expired, unreadable)
    pub misses: u64,

    /// Misses caused by an entry past its `expires_at`
    pub lazy_expirations: u64,

    /// Misses caused by store errors or undecodable bytes
    pub read_errors: u64,

    /// Successful writes
    pub writes: u64,

    /// Writes that failed and were swallowed
    pub write_failures: u64,

    /// Explicit invalidations
    pub invalidations: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            100.0 - self.hit_rate()
        }
    }

    /// Total number of reads
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}
