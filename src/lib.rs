//! # Configurator Assets (configurator-assets)
//!
//! Delivery and caching for the 3D jewelry configurator: rendered frame
//! sequences, catalog data and the performance signals around them.
//!
//! ## Features
//!
//! - Category-scoped tiered cache with fixed TTLs and lazy expiry
//! - Device and network aware quality tiers
//! - Two-phase preloading: a small concurrent eager batch, then a
//!   sequential background loop that stops when superseded
//! - Rolling performance governor with threshold alerts and reports
//! - Async-first design using tokio
//!
//! ## Planning a Sequence
//!
//! ```no_run
//! use configurator_assets::{
//!     DeliveryConfig, DeliveryService, DeviceClass, HttpAssetFetcher, MemoryStore, NetworkClass,
//!     PlanRequest,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DeliveryConfig::from_env()?;
//!     let fetcher = HttpAssetFetcher::new(config.request_timeout)?;
//!     let service = DeliveryService::new(config, Arc::new(MemoryStore::new()), Arc::new(fetcher))?;
//!
//!     let request = PlanRequest::new("ring42", "gold")
//!         .device(DeviceClass::HighEnd)
//!         .network(NetworkClass::Slow);
//!
//!     let plan = service.plan_tier(&request).await?;
//!     println!("{} frames for {}", plan.frame_count(), plan.effective_device);
//!     Ok(())
//! }
//! ```
//!
//! ## Preloading
//!
//! The call returns once the eager batch has loaded. The background phase
//! keeps running on the runtime; its handle can be awaited or dropped.
//!
//! ```no_run
//! use configurator_assets::{DeliveryConfig, DeliveryService, HttpAssetFetcher, MemoryStore, PlanRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DeliveryConfig::default();
//!     let fetcher = HttpAssetFetcher::new(config.request_timeout)?;
//!     let service = DeliveryService::new(config, Arc::new(MemoryStore::new()), Arc::new(fetcher))?;
//!
//!     let outcome = service.preload_assets(&PlanRequest::new("ring42", "gold")).await?;
//!     println!("Preview ready after {} frames", outcome.eager_loaded);
//!
//!     if let Some(background) = outcome.background {
//!         let report = background.await?;
//!         println!("{} loaded, {} skipped", report.loaded.len(), report.skipped.len());
//!     }
//!
//!     println!("{:?}", service.performance_snapshot());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod error;
pub mod governor;
pub mod service;

// Re-export main types for convenience
pub use cache::{
    CacheCategory, CacheEntry, CacheStats, KeyValueStore, MemoryStore, TieredCacheManager,
    WarmEntry, WarmSummary,
};
pub use catalog::{CatalogService, CatalogSource, MaterialOption, Variant};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DeliveryConfig, DeliveryConfigBuilder, GovernorConfig, GovernorThresholds};
pub use delivery::{
    AssetFetcher, AssetFormat, AssetPlan, BackgroundReport, DeliveryPlanner, DeviceClass,
    HttpAssetFetcher, NetworkClass, PlanRequest, PreloadOutcome, QualityTier, TierSpec, TierTable,
};
pub use error::{DeliveryError, Result};
pub use governor::{
    Alert, AlertKind, Metric, MetricSample, PerformanceGovernor, PerformanceReport,
    PerformanceSnapshot, Severity,
};
pub use service::{DeliveryService, PopularBundle};
