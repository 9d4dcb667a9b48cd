//! Aggregates over the metric window: snapshots, buckets and recommendations

use crate::config::GovernorThresholds;
use crate::governor::alert::{Alert, AlertKind, Severity};
use crate::governor::metric::Metric;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HOUR_MS: i64 = 3_600_000;

/// Aggregate view of the trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    pub avg_latency_ms: f64,
    pub p95_latency_ms: u64,
    pub error_rate_pct: f64,
    pub cache_hit_rate_pct: f64,
    pub sample_count: usize,
    pub is_within_target: bool,
}

impl PerformanceSnapshot {
    /// Snapshot of an empty window
    pub fn empty() -> Self {
        Self {
            avg_latency_ms: 0.0,
            p95_latency_ms: 0,
            error_rate_pct: 0.0,
            cache_hit_rate_pct: 0.0,
            sample_count: 0,
            is_within_target: true,
        }
    }

    /// Aggregate `metrics` and judge them against `thresholds`
    pub fn compute<'a, I>(metrics: I, thresholds: &GovernorThresholds) -> Self
    where
        I: IntoIterator<Item = &'a Metric>,
    {
        let mut latencies = Vec::new();
        let mut errors = 0usize;
        let mut hits = 0usize;

        for metric in metrics {
            latencies.push(metric.latency_ms);
            if metric.is_error() {
                errors += 1;
            }
            if metric.cache_hit {
                hits += 1;
            }
        }

        let n = latencies.len();
        if n == 0 {
            return Self::empty();
        }

        let avg_latency_ms = latencies.iter().map(|l| *l as f64).sum::<f64>() / n as f64;
        latencies.sort_unstable();
        let p95_index = ((0.95 * n as f64).ceil() as usize).saturating_sub(1);
        let p95_latency_ms = latencies[p95_index.min(n - 1)];

        let error_rate_pct = errors as f64 / n as f64 * 100.0;
        let cache_hit_rate_pct = hits as f64 / n as f64 * 100.0;

        let is_within_target = avg_latency_ms <= thresholds.latency_target_ms
            && error_rate_pct <= thresholds.error_rate_pct
            && cache_hit_rate_pct >= thresholds.cache_hit_target_pct;

        Self {
            avg_latency_ms,
            p95_latency_ms,
            error_rate_pct,
            cache_hit_rate_pct,
            sample_count: n,
            is_within_target,
        }
    }

    /// Threshold crossings in this snapshot, at most one per kind
    pub fn violations(&self, thresholds: &GovernorThresholds, timestamp_ms: i64) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if self.sample_count == 0 {
            return alerts;
        }

        if self.avg_latency_ms > thresholds.latency_target_ms {
            alerts.push(Alert {
                kind: AlertKind::Latency,
                threshold: thresholds.latency_target_ms,
                observed_value: self.avg_latency_ms,
                timestamp_ms,
                severity: if self.avg_latency_ms > thresholds.latency_critical_ms {
                    Severity::Critical
                } else {
                    Severity::High
                },
            });
        }

        if self.error_rate_pct > thresholds.error_rate_pct {
            alerts.push(Alert {
                kind: AlertKind::ErrorRate,
                threshold: thresholds.error_rate_pct,
                observed_value: self.error_rate_pct,
                timestamp_ms,
                severity: if self.error_rate_pct > thresholds.error_rate_critical_pct {
                    Severity::Critical
                } else {
                    Severity::Medium
                },
            });
        }

        if self.cache_hit_rate_pct < thresholds.cache_hit_target_pct {
            alerts.push(Alert {
                kind: AlertKind::CacheMissRate,
                threshold: thresholds.cache_hit_target_pct,
                observed_value: self.cache_hit_rate_pct,
                timestamp_ms,
                severity: if self.cache_hit_rate_pct < thresholds.cache_hit_high_pct {
                    Severity::High
                } else {
                    Severity::Medium
                },
            });
        }

        alerts
    }
}

/// Aggregates for one bucket of metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub avg_latency_ms: f64,
    pub request_count: usize,
    pub error_rate_pct: f64,
}

#[derive(Default)]
struct BucketAccumulator {
    latency_sum: u64,
    count: usize,
    errors: usize,
}

impl BucketAccumulator {
    fn add(&mut self, metric: &Metric) {
        self.latency_sum = self.latency_sum.saturating_add(metric.latency_ms);
        self.count += 1;
        if metric.is_error() {
            self.errors += 1;
        }
    }

    fn finish(self) -> BucketStats {
        let n = self.count.max(1) as f64;
        BucketStats {
            avg_latency_ms: self.latency_sum as f64 / n,
            request_count: self.count,
            error_rate_pct: self.errors as f64 / n * 100.0,
        }
    }
}

/// Metrics that fall in one clock hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourBucket {
    pub hour_start: DateTime<Utc>,
    pub stats: BucketStats,
}

/// Metrics for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointBucket {
    pub endpoint: String,
    pub stats: BucketStats,
}

/// Full report over the retained window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub snapshot: PerformanceSnapshot,
    pub retained_count: usize,
    pub by_hour: Vec<HourBucket>,
    pub by_endpoint: Vec<EndpointBucket>,
    pub recent_alerts: Vec<Alert>,
    pub recommendations: Vec<String>,
}

/// Group metrics by the hour their timestamp falls in, oldest hour first
pub fn bucket_by_hour<'a, I>(metrics: I) -> Vec<HourBucket>
where
    I: IntoIterator<Item = &'a Metric>,
{
    let mut buckets: BTreeMap<i64, BucketAccumulator> = BTreeMap::new();
    for metric in metrics {
        let hour = metric.timestamp_ms.div_euclid(HOUR_MS) * HOUR_MS;
        buckets.entry(hour).or_default().add(metric);
    }

    buckets
        .into_iter()
        .map(|(hour, acc)| HourBucket {
            hour_start: Utc
                .timestamp_millis_opt(hour)
                .single()
                .unwrap_or_default(),
            stats: acc.finish(),
        })
        .collect()
}

/// Group metrics by endpoint, alphabetically
pub fn bucket_by_endpoint<'a, I>(metrics: I) -> Vec<EndpointBucket>
where
    I: IntoIterator<Item = &'a Metric>,
{
    let mut buckets: BTreeMap<&str, BucketAccumulator> = BTreeMap::new();
    for metric in metrics {
        buckets.entry(metric.endpoint.as_str()).or_default().add(metric);
    }

    buckets
        .into_iter()
        .map(|(endpoint, acc)| EndpointBucket {
            endpoint: endpoint.to_string(),
            stats: acc.finish(),
        })
        .collect()
}

/// Advice derived from a snapshot; same snapshot, same advice
pub fn recommendations(
    snapshot: &PerformanceSnapshot,
    thresholds: &GovernorThresholds,
) -> Vec<String> {
    if snapshot.sample_count == 0 {
        return vec!["No metrics recorded yet".to_string()];
    }

    let mut advice = Vec::new();

    if snapshot.avg_latency_ms > thresholds.latency_target_ms {
        advice.push(format!(
            "Latency above target ({:.0}ms > {:.0}ms): serve the immediate tier first and warm popular configurations",
            snapshot.avg_latency_ms, thresholds.latency_target_ms
        ));
    }
    if (snapshot.p95_latency_ms as f64) > thresholds.latency_critical_ms {
        advice.push(format!(
            "p95 latency {}ms above {:.0}ms: check the asset origin for slow frames",
            snapshot.p95_latency_ms, thresholds.latency_critical_ms
        ));
    }
    if snapshot.error_rate_pct > thresholds.error_rate_pct {
        advice.push(format!(
            "Error rate above target ({:.1}% > {:.1}%): inspect failing endpoints",
            snapshot.error_rate_pct, thresholds.error_rate_pct
        ));
    }
    if snapshot.cache_hit_rate_pct < thresholds.cache_hit_target_pct {
        advice.push(format!(
            "Cache hit rate below target ({:.1}% < {:.1}%): warm popular bundles or review TTLs",
            snapshot.cache_hit_rate_pct, thresholds.cache_hit_target_pct
        ));
    }

    if advice.is_empty() {
        advice.push("All performance targets met".to_string());
    }
    advice
}
