//! Configuration for delivery planning and performance governance

use crate::error::{DeliveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Alert thresholds for the performance governor
///
/// These are tunable policy values. The defaults match the targets the
/// configurator has historically been held to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GovernorThresholds {
    /// Average latency above this raises a `high` latency alert
    pub latency_target_ms: f64,

    /// Average latency above this escalates to `critical`
    pub latency_critical_ms: f64,

    /// Error rate (percent) above this raises a `medium` alert
    pub error_rate_pct: f64,

    /// Error rate (percent) above this escalates to `critical`
    pub error_rate_critical_pct: f64,

    /// Cache hit rate (percent) below this raises a `medium` alert
    pub cache_hit_target_pct: f64,

    /// Cache hit rate (percent) below this escalates to `high`
    pub cache_hit_high_pct: f64,
}

impl Default for GovernorThresholds {
    fn default() -> Self {
        Self {
            latency_target_ms: 300.0,
            latency_critical_ms: 500.0,
            error_rate_pct: 1.0,
            error_rate_critical_pct: 5.0,
            cache_hit_target_pct: 80.0,
            cache_hit_high_pct: 60.0,
        }
    }
}

/// Sizing and thresholds for the performance governor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Alert thresholds
    pub thresholds: GovernorThresholds,

    /// Metrics kept in the ring buffer; older ones are evicted first
    pub retained_metrics: usize,

    /// Trailing window used for snapshots and alert evaluation
    pub trailing_window: usize,

    /// Alerts surfaced to consumers by `recent_alerts`
    pub surfaced_alerts: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            thresholds: GovernorThresholds::default(),
            retained_metrics: 1000,
            trailing_window: 100,
            surfaced_alerts: 10,
        }
    }
}

/// Configuration for the delivery subsystem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Asset origin base URL; a trailing slash is ignored
    pub base_url: String,

    /// Time budget for a single asset request
    pub request_timeout: Duration,

    /// Frames loaded concurrently before a preview is shown
    pub eager_frames: usize,

    /// Performance governor settings
    pub governor: GovernorConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: "/assets/3d".to_string(),
            request_timeout: Duration::from_secs(10),
            eager_frames: 4,
            governor: GovernorConfig::default(),
        }
    }
}

impl DeliveryConfig {
    /// Create a new builder for delivery configuration
    pub fn builder() -> DeliveryConfigBuilder {
        DeliveryConfigBuilder::default()
    }

    /// Load configuration from the environment, reading `.env` if present
    ///
    /// Unset variables keep their defaults; malformed ones are an error.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load a specific `.env` file, then read the environment as `from_env` does
    ///
    /// Variables already set in the process environment win over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenv::from_path(path).map_err(|e| {
            DeliveryError::Config(format!("cannot load {}: {}", path.display(), e))
        })?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(url) = lookup("ASSET_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(ms) = lookup("ASSET_REQUEST_TIMEOUT_MS") {
            builder = builder.request_timeout(Duration::from_millis(parse_var(
                "ASSET_REQUEST_TIMEOUT_MS",
                &ms,
            )?));
        }
        if let Some(n) = lookup("ASSET_EAGER_FRAMES") {
            builder = builder.eager_frames(parse_var("ASSET_EAGER_FRAMES", &n)?);
        }

        let mut thresholds = GovernorThresholds::default();
        if let Some(v) = lookup("GOVERNOR_LATENCY_TARGET_MS") {
            thresholds.latency_target_ms = parse_var("GOVERNOR_LATENCY_TARGET_MS", &v)?;
        }
        if let Some(v) = lookup("GOVERNOR_ERROR_RATE_PCT") {
            thresholds.error_rate_pct = parse_var("GOVERNOR_ERROR_RATE_PCT", &v)?;
        }
        if let Some(v) = lookup("GOVERNOR_CACHE_HIT_TARGET_PCT") {
            thresholds.cache_hit_target_pct = parse_var("GOVERNOR_CACHE_HIT_TARGET_PCT", &v)?;
        }

        let config = builder.thresholds(thresholds).build();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(DeliveryError::Config("base_url must not be empty".to_string()));
        }

        if self.eager_frames == 0 {
            return Err(DeliveryError::Config(
                "eager_frames must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(DeliveryError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        let g = &self.governor;
        if g.retained_metrics == 0 || g.trailing_window == 0 {
            return Err(DeliveryError::Config(
                "governor windows must be greater than 0".to_string(),
            ));
        }
        if g.trailing_window > g.retained_metrics {
            return Err(DeliveryError::Config(
                "trailing_window cannot exceed retained_metrics".to_string(),
            ));
        }

        let t = &g.thresholds;
        if t.latency_critical_ms < t.latency_target_ms {
            return Err(DeliveryError::Config(
                "latency_critical_ms must be >= latency_target_ms".to_string(),
            ));
        }
        if t.error_rate_critical_pct < t.error_rate_pct {
            return Err(DeliveryError::Config(
                "error_rate_critical_pct must be >= error_rate_pct".to_string(),
            ));
        }
        if t.cache_hit_high_pct > t.cache_hit_target_pct {
            return Err(DeliveryError::Config(
                "cache_hit_high_pct must be <= cache_hit_target_pct".to_string(),
            ));
        }
        for pct in [t.error_rate_pct, t.cache_hit_target_pct, t.cache_hit_high_pct] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(DeliveryError::Config(
                    "percentages must be between 0 and 100".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DeliveryError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}

/// Builder for delivery configuration
#[derive(Debug, Default)]
pub struct DeliveryConfigBuilder {
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    eager_frames: Option<usize>,
    thresholds: Option<GovernorThresholds>,
    retained_metrics: Option<usize>,
    trailing_window: Option<usize>,
    surfaced_alerts: Option<usize>,
}

impl DeliveryConfigBuilder {
    /// Set the asset origin base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set how many frames the eager phase loads
    pub fn eager_frames(mut self, frames: usize) -> Self {
        self.eager_frames = Some(frames);
        self
    }

    /// Set the governor thresholds
    pub fn thresholds(mut self, thresholds: GovernorThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Set the ring buffer size
    pub fn retained_metrics(mut self, n: usize) -> Self {
        self.retained_metrics = Some(n);
        self
    }

    /// Set the trailing window size
    pub fn trailing_window(mut self, n: usize) -> Self {
        self.trailing_window = Some(n);
        self
    }

    /// Set how many alerts are surfaced
    pub fn surfaced_alerts(mut self, n: usize) -> Self {
        self.surfaced_alerts = Some(n);
        self
    }

    /// Build the delivery configuration
    pub fn build(self) -> DeliveryConfig {
        let defaults = DeliveryConfig::default();

        DeliveryConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            eager_frames: self.eager_frames.unwrap_or(defaults.eager_frames),
            governor: GovernorConfig {
                thresholds: self.thresholds.unwrap_or(defaults.governor.thresholds),
                retained_metrics: self
                    .retained_metrics
                    .unwrap_or(defaults.governor.retained_metrics),
                trailing_window: self
                    .trailing_window
                    .unwrap_or(defaults.governor.trailing_window),
                surfaced_alerts: self
                    .surfaced_alerts
                    .unwrap_or(defaults.governor.surfaced_alerts),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DeliveryConfig::default();
        assert_eq!(config.eager_frames, 4);
        assert_eq!(config.governor.retained_metrics, 1000);
        assert_eq!(config.governor.trailing_window, 100);
        assert_eq!(config.governor.surfaced_alerts, 10);
        assert_eq!(config.governor.thresholds.latency_target_ms, 300.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = DeliveryConfig::default();
        invalid.base_url = "  ".to_string();
        assert!(invalid.validate().is_err());

        let invalid = DeliveryConfig::builder().trailing_window(2000).build();
        assert!(invalid.validate().is_err());

        let mut invalid = DeliveryConfig::default();
        invalid.governor.thresholds.latency_critical_ms = 100.0;
        assert!(invalid.validate().is_err());

        let invalid = DeliveryConfig::builder().eager_frames(0).build();
        assert!(matches!(invalid.validate(), Err(DeliveryError::Config(_))));

        let result = DeliveryConfig::from_lookup(|name| {
            (name == "ASSET_EAGER_FRAMES").then(|| "0".to_string())
        });
        assert!(matches!(result, Err(DeliveryError::Config(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = DeliveryConfig::builder()
            .base_url("https://cdn.example.com/3d/")
            .request_timeout(Duration::from_millis(2500))
            .eager_frames(6)
            .build();

        assert_eq!(config.normalized_base_url(), "https://cdn.example.com/3d");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.eager_frames, 6);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ASSET_BASE_URL", "https://cdn.example.com"),
            ("ASSET_REQUEST_TIMEOUT_MS", "750"),
            ("GOVERNOR_LATENCY_TARGET_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config =
            DeliveryConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "https://cdn.example.com");
        assert_eq!(config.request_timeout, Duration::from_millis(750));
        assert_eq!(config.governor.thresholds.latency_target_ms, 250.0);
        assert_eq!(config.eager_frames, 4);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = DeliveryConfig::from_lookup(|name| {
            (name == "ASSET_EAGER_FRAMES").then(|| "four".to_string())
        });
        assert!(matches!(result, Err(DeliveryError::Config(_))));
    }

    #[test]
    fn test_from_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ASSET_BASE_URL=https://cdn.example.com/3d").unwrap();
        writeln!(file, "ASSET_EAGER_FRAMES=2").unwrap();
        writeln!(file, "GOVERNOR_CACHE_HIT_TARGET_PCT=70").unwrap();
        file.flush().unwrap();

        let config = DeliveryConfig::from_env_file(file.path()).unwrap();
        assert_eq!(config.base_url, "https://cdn.example.com/3d");
        assert_eq!(config.eager_frames, 2);
        assert_eq!(config.governor.thresholds.cache_hit_target_pct, 70.0);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_env_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = DeliveryConfig::from_env_file(dir.path().join("absent.env"));
        assert!(matches!(result, Err(DeliveryError::Config(_))));
    }
}
