//! Rolling-window performance governor
//!
//! Every `record` appends to a bounded ring buffer, recomputes the trailing
//! window and compares it against the thresholds. Alerts are edge-triggered
//! per kind: a kind alerts when it first crosses its threshold and again
//! only if its severity escalates. Once the window recovers the kind is
//! re-armed.

use crate::clock::{Clock, SystemClock};
use crate::config::GovernorConfig;
use crate::governor::alert::{Alert, AlertKind, Severity};
use crate::governor::metric::{Metric, MetricSample};
use crate::governor::report::{
    bucket_by_endpoint, bucket_by_hour, recommendations, PerformanceReport, PerformanceSnapshot,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

struct GovernorState {
    metrics: VecDeque<Metric>,
    alerts: VecDeque<Alert>,
    active: HashMap<AlertKind, Severity>,
}

impl GovernorState {
    fn trailing(&self, window: usize) -> impl Iterator<Item = &Metric> {
        let start = self.metrics.len().saturating_sub(window);
        self.metrics.range(start..)
    }
}

/// Collects operation metrics and raises threshold alerts
pub struct PerformanceGovernor {
    config: GovernorConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<GovernorState>,
}

impl PerformanceGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: GovernorConfig, clock: Arc<dyn Clock>) -> Self {
        let retained = config.retained_metrics.max(1);
        Self {
            config,
            clock,
            state: Mutex::new(GovernorState {
                metrics: VecDeque::with_capacity(retained),
                alerts: VecDeque::new(),
                active: HashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Record one operation and return the alerts it raised
    ///
    /// Never fails: malformed samples are normalized first.
    pub fn record(&self, sample: impl Into<MetricSample>) -> Vec<Alert> {
        let metric = sample.into().normalize(self.clock.now_millis());
        let retained = self.config.retained_metrics.max(1);
        let thresholds = &self.config.thresholds;

        let raised = {
            let mut state = self.state.lock();

            let timestamp_ms = metric.timestamp_ms;
            state.metrics.push_back(metric);
            while state.metrics.len() > retained {
                state.metrics.pop_front();
            }

            let snapshot =
                PerformanceSnapshot::compute(state.trailing(self.config.trailing_window), thresholds);
            let violations = snapshot.violations(thresholds, timestamp_ms);

            let mut raised = Vec::new();
            let violated: Vec<AlertKind> = violations.iter().map(|a| a.kind).collect();
            for alert in violations {
                let escalates = match state.active.get(&alert.kind) {
                    None => true,
                    Some(previous) => alert.severity > *previous,
                };
                state.active.insert(alert.kind, alert.severity);
                if escalates {
                    raised.push(alert);
                }
            }
            state.active.retain(|kind, _| violated.contains(kind));

            for alert in &raised {
                state.alerts.push_back(alert.clone());
            }
            while state.alerts.len() > retained {
                state.alerts.pop_front();
            }

            raised
        };

        for alert in &raised {
            if alert.severity == Severity::Critical {
                error!(kind = %alert.kind, severity = %alert.severity, "{}", alert.message());
            } else {
                warn!(kind = %alert.kind, severity = %alert.severity, "{}", alert.message());
            }
        }

        raised
    }

    /// Aggregates over the trailing window
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let state = self.state.lock();
        PerformanceSnapshot::compute(
            state.trailing(self.config.trailing_window),
            &self.config.thresholds,
        )
    }

    /// Most recent alerts, oldest first
    pub fn recent_alerts(&self) -> Vec<Alert> {
        let state = self.state.lock();
        let start = state.alerts.len().saturating_sub(self.config.surfaced_alerts);
        state.alerts.range(start..).cloned().collect()
    }

    /// Copy of the retained metrics, oldest first
    pub fn metrics(&self) -> Vec<Metric> {
        self.state.lock().metrics.iter().cloned().collect()
    }

    /// Number of retained metrics
    pub fn len(&self) -> usize {
        self.state.lock().metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().metrics.is_empty()
    }

    /// Snapshot, hourly and per-endpoint buckets over everything retained,
    /// recent alerts and recommendations
    pub fn report(&self) -> PerformanceReport {
        let state = self.state.lock();
        let thresholds = &self.config.thresholds;

        let snapshot =
            PerformanceSnapshot::compute(state.trailing(self.config.trailing_window), thresholds);
        let start = state.alerts.len().saturating_sub(self.config.surfaced_alerts);

        PerformanceReport {
            generated_at: self.clock.now(),
            retained_count: state.metrics.len(),
            by_hour: bucket_by_hour(state.metrics.iter()),
            by_endpoint: bucket_by_endpoint(state.metrics.iter()),
            recent_alerts: state.alerts.range(start..).cloned().collect(),
            recommendations: recommendations(&snapshot, thresholds),
            snapshot,
        }
    }

    /// Drop all metrics and alerts
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.metrics.clear();
        state.alerts.clear();
        state.active.clear();
        debug!("Performance governor cleared");
    }

    /// Start timing an operation
    pub fn start(&self, endpoint: impl Into<String>) -> OperationTimer<'_> {
        OperationTimer {
            governor: self,
            endpoint: endpoint.into(),
            started: Instant::now(),
        }
    }
}

/// Times one operation and records it when finished
#[must_use = "an unfinished timer records nothing"]
pub struct OperationTimer<'a> {
    governor: &'a PerformanceGovernor,
    endpoint: String,
    started: Instant,
}

impl OperationTimer<'_> {
    /// Record the elapsed time with the given outcome
    pub fn finish(self, status_code: u16, cache_hit: bool) -> Vec<Alert> {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        self.governor.record(
            MetricSample::new(self.endpoint, elapsed_ms)
                .status(status_code as i64)
                .cache_hit(cache_hit),
        )
    }
}
