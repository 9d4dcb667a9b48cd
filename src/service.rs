//! Entry point used by the presentation layer
//!
//! Built once at startup and shared by handle. Every call is timed and
//! recorded with the governor, whether it succeeds or fails.

use crate::cache::{
    CacheCategory, CacheStats, KeyValueStore, TieredCacheManager, WarmEntry, WarmSummary,
};
use crate::catalog::{CatalogService, CatalogSource};
use crate::clock::{Clock, SystemClock};
use crate::config::DeliveryConfig;
use crate::delivery::{
    AssetFetcher, AssetPlan, DeliveryPlanner, PlanRequest, PreloadOutcome, TierTable,
};
use crate::error::Result;
use crate::governor::{Alert, PerformanceGovernor, PerformanceReport, PerformanceSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// A popular configuration to keep warm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularBundle {
    pub config_id: String,
    pub material_id: String,
    pub payload: Value,
}

impl PopularBundle {
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.config_id, self.material_id)
    }
}

/// Cache manager, planner and governor wired together
pub struct DeliveryService {
    config: DeliveryConfig,
    cache: Arc<TieredCacheManager>,
    planner: Arc<DeliveryPlanner>,
    governor: Arc<PerformanceGovernor>,
}

impl DeliveryService {
    /// Build the service with the system clock and standard tier table
    pub fn new(
        config: DeliveryConfig,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Result<Self> {
        Self::with_parts(config, store, fetcher, Arc::new(SystemClock), TierTable::standard())
    }

    /// Build the service with an explicit clock and tier table
    pub fn with_parts(
        config: DeliveryConfig,
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn AssetFetcher>,
        clock: Arc<dyn Clock>,
        table: TierTable,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(TieredCacheManager::with_clock(store, clock.clone()));
        let planner =
            Arc::new(DeliveryPlanner::new(&config, cache.clone(), fetcher).with_table(table));
        let governor = Arc::new(PerformanceGovernor::with_clock(config.governor.clone(), clock));

        info!(
            base_url = %config.normalized_base_url(),
            eager_frames = config.eager_frames,
            "Delivery service ready"
        );

        Ok(Self {
            config,
            cache,
            planner,
            governor,
        })
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub fn cache(&self) -> Arc<TieredCacheManager> {
        self.cache.clone()
    }

    pub fn planner(&self) -> Arc<DeliveryPlanner> {
        self.planner.clone()
    }

    pub fn governor(&self) -> Arc<PerformanceGovernor> {
        self.governor.clone()
    }

    /// Catalog access sharing this service's cache and governor
    pub fn catalog(&self, source: Arc<dyn CatalogSource>) -> CatalogService {
        CatalogService::new(source, self.cache.clone(), self.governor.clone())
    }

    /// Ordered frame URLs for a request
    pub async fn plan_tier(&self, request: &PlanRequest) -> Result<AssetPlan> {
        let timer = self.governor.start("planTier");
        match self.planner.lookup_plan(request).await {
            Ok(lookup) => {
                timer.finish(200, lookup.from_cache);
                Ok(lookup.plan)
            }
            Err(e) => {
                timer.finish(e.status_code(), false);
                Err(e)
            }
        }
    }

    /// Load the eager batch and schedule the rest
    ///
    /// The result reflects the eager phase only.
    pub async fn preload_assets(&self, request: &PlanRequest) -> Result<PreloadOutcome> {
        let timer = self.governor.start("preloadAssets");
        match self.planner.preload_assets(request).await {
            Ok(outcome) => {
                timer.finish(200, outcome.from_cache);
                Ok(outcome)
            }
            Err(e) => {
                timer.finish(e.status_code(), false);
                Err(e)
            }
        }
    }

    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        self.governor.snapshot()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        self.governor.report()
    }

    pub fn recent_alerts(&self) -> Vec<Alert> {
        self.governor.recent_alerts()
    }

    /// Pre-populate the `popular` category
    pub async fn warm_popular(&self, bundles: Vec<PopularBundle>) -> WarmSummary {
        let entries = bundles
            .into_iter()
            .map(|bundle| WarmEntry::new(CacheCategory::Popular, bundle.identifier(), bundle.payload))
            .collect();
        self.cache.warm(entries).await
    }

    /// Administrative delete of one cache entry
    pub async fn invalidate(&self, category: CacheCategory, identifier: &str) -> Result<()> {
        self.cache.invalidate(category, identifier).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
