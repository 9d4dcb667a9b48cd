//! Integration tests for the performance governor
//!
//! These tests verify:
//! - Rolling window bounds
//! - Alert severities and their edge-triggered behavior
//! - Concurrent recording
//! - Report buckets and recommendations

use chrono::{TimeZone, Utc};
use configurator_assets::clock::ManualClock;
use configurator_assets::config::GovernorConfig;
use configurator_assets::governor::{
    Alert, AlertKind, Metric, MetricSample, PerformanceGovernor, Severity,
};
use std::sync::Arc;

fn sample(latency: f64) -> MetricSample {
    MetricSample::new("planTier", latency).status(200).cache_hit(true)
}

fn governor() -> PerformanceGovernor {
    PerformanceGovernor::new(GovernorConfig::default())
}

#[test]
fn test_trailing_window_drops_oldest() {
    let governor = governor();

    governor.record(sample(10_000.0));
    for _ in 0..100 {
        governor.record(sample(100.0));
    }

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.sample_count, 100);
    assert_eq!(snapshot.avg_latency_ms, 100.0);
    assert_eq!(snapshot.p95_latency_ms, 100);
    assert!(snapshot.is_within_target);

    // Still retained, just outside the window
    assert_eq!(governor.len(), 101);
}

#[test]
fn test_ring_buffer_caps_at_1000() {
    let governor = governor();
    for i in 0..1_200 {
        governor.record(sample(i as f64));
    }

    let metrics = governor.metrics();
    assert_eq!(metrics.len(), 1_000);
    assert_eq!(metrics[0].latency_ms, 200);
    assert_eq!(metrics[999].latency_ms, 1_199);
}

#[test]
fn test_sustained_latency_raises_one_high_alert() {
    let governor = governor();

    let raised: Vec<Alert> = (0..50).flat_map(|_| governor.record(sample(350.0))).collect();

    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::Latency);
    assert_eq!(raised[0].severity, Severity::High);
    assert_eq!(raised[0].threshold, 300.0);
    assert_eq!(raised[0].observed_value, 350.0);

    assert_eq!(governor.recent_alerts().len(), 1);
    assert!(!governor.snapshot().is_within_target);
}

#[test]
fn test_critical_latency() {
    let governor = governor();

    let raised = governor.record(sample(520.0));

    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].severity, Severity::Critical);
}

#[test]
fn test_latency_at_target_is_not_an_alert() {
    let governor = governor();
    assert!(governor.record(sample(300.0)).is_empty());
    assert!(governor.snapshot().is_within_target);
}

#[test]
fn test_error_rate_severities() {
    let governor = governor();

    // 2 errors in the last 100: medium
    for i in 0..100 {
        let status = if i >= 98 { 500 } else { 200 };
        governor.record(sample(50.0).status(status));
    }
    let alerts = governor.recent_alerts();
    let error_alerts: Vec<&Alert> = alerts
        .iter()
        .filter(|a| a.kind == AlertKind::ErrorRate)
        .collect();
    assert_eq!(error_alerts.len(), 1);
    assert_eq!(error_alerts[0].severity, Severity::Medium);

    // Four more push the window to 6%: escalates to critical
    for _ in 0..4 {
        governor.record(sample(50.0).status(503));
    }
    let last = governor.recent_alerts().pop().unwrap();
    assert_eq!(last.kind, AlertKind::ErrorRate);
    assert_eq!(last.severity, Severity::Critical);
}

#[test]
fn test_cache_miss_severities() {
    let config = GovernorConfig {
        trailing_window: 10,
        ..Default::default()
    };
    let governor = PerformanceGovernor::new(config);

    // 7 of 10 hits: medium
    for i in 0..10 {
        governor.record(sample(50.0).cache_hit(i < 7));
    }
    let alerts = governor.recent_alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::CacheMissRate);
    assert_eq!(alerts[0].severity, Severity::Medium);

    // Window drops to 50%: high
    let config = GovernorConfig {
        trailing_window: 10,
        ..Default::default()
    };
    let governor = PerformanceGovernor::new(config);
    for i in 0..10 {
        governor.record(sample(50.0).cache_hit(i % 2 == 0));
    }
    let last = governor.recent_alerts().pop().unwrap();
    assert_eq!(last.severity, Severity::High);
}

#[test]
fn test_surfaced_alerts_are_capped() {
    let config = GovernorConfig {
        trailing_window: 1,
        ..Default::default()
    };
    let governor = PerformanceGovernor::new(config);

    // Alternate breach and recovery: every breach alerts again
    for _ in 0..15 {
        governor.record(sample(400.0));
        governor.record(sample(10.0));
    }

    let recent = governor.recent_alerts();
    assert_eq!(recent.len(), 10);
    assert!(recent.iter().all(|a| a.kind == AlertKind::Latency));
}

#[test]
fn test_malformed_samples_are_normalized() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let governor = PerformanceGovernor::with_clock(GovernorConfig::default(), clock);

    governor.record(MetricSample::new("", -5.0));
    governor.record(MetricSample::new("planTier", f64::NAN).status(1_000));
    governor.record(MetricSample::new("planTier", 12.4).status(42));

    let metrics = governor.metrics();
    assert_eq!(metrics[0].endpoint, "unknown");
    assert_eq!(metrics[0].latency_ms, 0);
    assert_eq!(metrics[0].status_code, 200);
    assert_eq!(metrics[0].timestamp_ms, start.timestamp_millis());

    assert_eq!(metrics[1].latency_ms, 0);
    assert_eq!(metrics[1].status_code, 599);
    assert!(metrics[1].is_error());

    assert_eq!(metrics[2].latency_ms, 12);
    assert_eq!(metrics[2].status_code, 100);
}

#[test]
fn test_concurrent_recording() {
    let governor = Arc::new(governor());

    std::thread::scope(|scope| {
        for t in 0..8 {
            let governor = governor.clone();
            scope.spawn(move || {
                for i in 0..200 {
                    governor.record(
                        MetricSample::new(format!("worker{}", t), (i % 50) as f64)
                            .status(200)
                            .cache_hit(true),
                    );
                }
            });
        }
    });

    assert_eq!(governor.len(), 1_000);
    assert_eq!(governor.snapshot().sample_count, 100);
    assert!(governor.recent_alerts().is_empty());
}

#[test]
fn test_report_buckets_and_recommendations() {
    let hour = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(hour));
    let governor = PerformanceGovernor::with_clock(GovernorConfig::default(), clock);

    let base = hour.timestamp_millis();
    let next_hour = base + 3_600_000;

    governor.record(Metric::new("planTier", 100, base + 1_000, 200, true));
    governor.record(Metric::new("planTier", 300, base + 2_000, 200, false));
    governor.record(Metric::new("preloadAssets", 800, next_hour + 5, 502, false));

    let report = governor.report();

    assert_eq!(report.generated_at, hour);
    assert_eq!(report.retained_count, 3);

    assert_eq!(report.by_hour.len(), 2);
    assert_eq!(report.by_hour[0].hour_start, hour);
    assert_eq!(report.by_hour[0].stats.request_count, 2);
    assert_eq!(report.by_hour[0].stats.avg_latency_ms, 200.0);
    assert_eq!(report.by_hour[1].stats.error_rate_pct, 100.0);

    let endpoints: Vec<&str> = report.by_endpoint.iter().map(|b| b.endpoint.as_str()).collect();
    assert_eq!(endpoints, vec!["planTier", "preloadAssets"]);

    // avg 400ms, p95 800ms, 33% errors, 33% hits
    assert_eq!(report.recommendations.len(), 4);
    assert!(!report.recent_alerts.is_empty());
}

#[test]
fn test_empty_report() {
    let report = governor().report();

    assert_eq!(report.snapshot.sample_count, 0);
    assert!(report.snapshot.is_within_target);
    assert!(report.by_hour.is_empty());
    assert_eq!(report.recommendations, vec!["No metrics recorded yet".to_string()]);
}

#[test]
fn test_healthy_window_recommendation() {
    let governor = governor();
    for _ in 0..20 {
        governor.record(sample(80.0));
    }

    assert_eq!(
        governor.report().recommendations,
        vec!["All performance targets met".to_string()]
    );
}
