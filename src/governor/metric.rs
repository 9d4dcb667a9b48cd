//! Operation metrics and their normalization

use serde::{Deserialize, Serialize};

/// One completed operation, as stored in the ring buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub endpoint: String,
    pub latency_ms: u64,
    pub timestamp_ms: i64,
    pub status_code: u16,
    pub cache_hit: bool,
}

impl Metric {
    pub fn new(
        endpoint: impl Into<String>,
        latency_ms: u64,
        timestamp_ms: i64,
        status_code: u16,
        cache_hit: bool,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            latency_ms,
            timestamp_ms,
            status_code,
            cache_hit,
        }
    }

    /// Status 400 and above counts as an error
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// Metric as reported by callers, before normalization
///
/// Every field is loose on purpose: recording must accept whatever arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub endpoint: String,
    pub latency_ms: f64,
    pub timestamp_ms: Option<i64>,
    pub status_code: Option<i64>,
    pub cache_hit: bool,
}

/// Status assumed when a sample carries none
pub const DEFAULT_STATUS: u16 = 200;

/// Endpoint name assumed when a sample carries none
pub const UNKNOWN_ENDPOINT: &str = "unknown";

impl MetricSample {
    pub fn new(endpoint: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            endpoint: endpoint.into(),
            latency_ms,
            ..Default::default()
        }
    }

    pub fn status(mut self, status_code: i64) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn cache_hit(mut self, hit: bool) -> Self {
        self.cache_hit = hit;
        self
    }

    pub fn at(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Clamp and default into a [`Metric`]
    ///
    /// Negative or non-finite latency becomes 0, a missing or out-of-range
    /// status becomes 200 or is clamped into 100..=599, a missing timestamp
    /// becomes `now_ms`, and a blank endpoint becomes `unknown`.
    pub fn normalize(self, now_ms: i64) -> Metric {
        let latency_ms = if self.latency_ms.is_finite() && self.latency_ms > 0.0 {
            self.latency_ms.round().min(u64::MAX as f64) as u64
        } else {
            0
        };

        let status_code = match self.status_code {
            None => DEFAULT_STATUS,
            Some(code) => code.clamp(100, 599) as u16,
        };

        let endpoint = if self.endpoint.trim().is_empty() {
            UNKNOWN_ENDPOINT.to_string()
        } else {
            self.endpoint
        };

        Metric {
            endpoint,
            latency_ms,
            timestamp_ms: self.timestamp_ms.unwrap_or(now_ms),
            status_code,
            cache_hit: self.cache_hit,
        }
    }
}

impl From<Metric> for MetricSample {
    fn from(metric: Metric) -> Self {
        Self {
            endpoint: metric.endpoint,
            latency_ms: metric.latency_ms as f64,
            timestamp_ms: Some(metric.timestamp_ms),
            status_code: Some(metric.status_code as i64),
            cache_hit: metric.cache_hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_latency_clamped() {
        let metric = MetricSample::new("planTier", -12.0).status(200).normalize(1_000);
        assert_eq!(metric.latency_ms, 0);
        assert_eq!(metric.timestamp_ms, 1_000);
    }

    #[test]
    fn test_missing_fields_defaulted() {
        let metric = MetricSample::new("  ", f64::NAN).normalize(42);
        assert_eq!(metric.endpoint, UNKNOWN_ENDPOINT);
        assert_eq!(metric.status_code, DEFAULT_STATUS);
        assert_eq!(metric.latency_ms, 0);
        assert!(!metric.is_error());
    }

    #[test]
    fn test_status_clamped() {
        assert_eq!(MetricSample::new("x", 1.0).status(-5).normalize(0).status_code, 100);
        assert_eq!(MetricSample::new("x", 1.0).status(9000).normalize(0).status_code, 599);
        assert!(MetricSample::new("x", 1.0).status(404).normalize(0).is_error());
    }

    #[test]
    fn test_metric_passes_through_unchanged() {
        let metric = Metric::new("preloadAssets", 120, 5_000, 502, true);
        assert_eq!(MetricSample::from(metric.clone()).normalize(0), metric);
    }
}
