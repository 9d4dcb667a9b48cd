//! # Performance Governor
//!
//! Observes every operation the cache and planner perform and keeps a
//! bounded, rolling view of how the subsystem is doing.
//!
//! ## Features
//!
//! - **Ring buffer**: the last 1000 metrics, oldest evicted first
//! - **Trailing window**: snapshots over the last 100 metrics
//! - **Threshold alerts**: latency, error rate and cache hit rate
//! - **Reports**: hourly and per-endpoint buckets plus recommendations
//!
//! ## Example
//!
//! ```rust
//! use configurator_assets::config::GovernorConfig;
//! use configurator_assets::governor::{MetricSample, PerformanceGovernor};
//!
//! let governor = PerformanceGovernor::new(GovernorConfig::default());
//!
//! governor.record(MetricSample::new("planTier", 42.0).status(200).cache_hit(true));
//!
//! let snapshot = governor.snapshot();
//! assert_eq!(snapshot.sample_count, 1);
//! assert!(snapshot.is_within_target);
//! ```

pub mod alert;
pub mod metric;
pub mod monitor;
pub mod report;

pub use alert::{Alert, AlertKind, Severity};
pub use metric::{Metric, MetricSample};
pub use monitor::{OperationTimer, PerformanceGovernor};
pub use report::{
    BucketStats, EndpointBucket, HourBucket, PerformanceReport, PerformanceSnapshot,
};
