//! Cache categories and their fixed TTL policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Category of cached data
///
/// Each category owns a key prefix and a TTL. TTLs are policy, not
/// something callers choose per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    /// Variant lists per product
    Variants,

    /// Material option catalogs per jewelry type
    Materials,

    /// Frame-sequence descriptors per configuration and material
    Sequences,

    /// Pre-built bundles for popular configurations
    Popular,
}

impl CacheCategory {
    /// All categories, in declaration order
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Variants,
        CacheCategory::Materials,
        CacheCategory::Sequences,
        CacheCategory::Popular,
    ];

    /// Static policy for this category
    pub fn config(&self) -> CategoryConfig {
        match self {
            CacheCategory::Variants => CategoryConfig {
                ttl_seconds: 900,
                key_prefix: "variants:",
            },
            // Material catalogs change least often
            CacheCategory::Materials => CategoryConfig {
                ttl_seconds: 3600,
                key_prefix: "materials:",
            },
            // Republishing assets invalidates these first
            CacheCategory::Sequences => CategoryConfig {
                ttl_seconds: 1800,
                key_prefix: "sequences:",
            },
            CacheCategory::Popular => CategoryConfig {
                ttl_seconds: 7200,
                key_prefix: "popular:",
            },
        }
    }

    /// Full store key for an identifier in this category
    pub fn key(&self, identifier: &str) -> String {
        format!("{}{}", self.config().key_prefix, identifier)
    }

    /// Parse a category from its lowercase name
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "variants" => Some(CacheCategory::Variants),
            "materials" => Some(CacheCategory::Materials),
            "sequences" => Some(CacheCategory::Sequences),
            "popular" => Some(CacheCategory::Popular),
            _ => None,
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheCategory::Variants => write!(f, "variants"),
            CacheCategory::Materials => write!(f, "materials"),
            CacheCategory::Sequences => write!(f, "sequences"),
            CacheCategory::Popular => write!(f, "popular"),
        }
    }
}

/// TTL and key prefix for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Lifetime of entries in seconds, always > 0
    pub ttl_seconds: u64,

    /// Prefix prepended to identifiers, unique per category
    pub key_prefix: &'static str,
}

impl CategoryConfig {
    /// TTL as a `Duration`
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_category_ttls() {
        assert_eq!(CacheCategory::Variants.config().ttl_seconds, 900);
        assert_eq!(CacheCategory::Materials.config().ttl_seconds, 3600);
        assert_eq!(CacheCategory::Sequences.config().ttl_seconds, 1800);
        assert_eq!(CacheCategory::Popular.config().ttl_seconds, 7200);
    }

    #[test]
    fn test_prefixes_are_unique() {
        let prefixes: HashSet<_> = CacheCategory::ALL
            .iter()
            .map(|c| c.config().key_prefix)
            .collect();
        assert_eq!(prefixes.len(), CacheCategory::ALL.len());
    }

    #[test]
    fn test_key_construction() {
        assert_eq!(
            CacheCategory::Sequences.key("ring42:gold"),
            "sequences:ring42:gold"
        );
        assert_eq!(CacheCategory::Variants.key("p-1"), "variants:p-1");
    }

    #[test]
    fn test_parse_and_display() {
        for category in CacheCategory::ALL {
            assert_eq!(CacheCategory::parse(&category.to_string()), Some(category));
        }
        assert_eq!(CacheCategory::parse("POPULAR"), Some(CacheCategory::Popular));
        assert_eq!(CacheCategory::parse("frames"), None);
    }
}
