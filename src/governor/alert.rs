//! Threshold alerts

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    Latency,
    ErrorRate,
    CacheMissRate,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Latency => write!(f, "latency"),
            AlertKind::ErrorRate => write!(f, "errorRate"),
            AlertKind::CacheMissRate => write!(f, "cacheMissRate"),
        }
    }
}

/// Alert severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A threshold crossing observed when a metric was recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub threshold: f64,
    pub observed_value: f64,
    pub timestamp_ms: i64,
    pub severity: Severity,
}

impl Alert {
    /// Human-readable summary
    pub fn message(&self) -> String {
        match self.kind {
            AlertKind::Latency => format!(
                "average latency {:.0}ms above {:.0}ms",
                self.observed_value, self.threshold
            ),
            AlertKind::ErrorRate => format!(
                "error rate {:.1}% above {:.1}%",
                self.observed_value, self.threshold
            ),
            AlertKind::CacheMissRate => format!(
                "cache hit rate {:.1}% below {:.1}%",
                self.observed_value, self.threshold
            ),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_alert_display() {
        let alert = Alert {
            kind: AlertKind::Latency,
            threshold: 300.0,
            observed_value: 350.0,
            timestamp_ms: 0,
            severity: Severity::High,
        };
        assert_eq!(alert.to_string(), "[high] latency: average latency 350ms above 300ms");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&AlertKind::CacheMissRate).unwrap(),
            "\"cacheMissRate\""
        );
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
    }
}
