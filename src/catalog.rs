//! Catalog read path: variants and material options, cached by category

use crate::cache::{CacheCategory, TieredCacheManager};
use crate::error::Result;
use crate::governor::PerformanceGovernor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A purchasable configuration of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub jewelry_type: String,
    pub material_id: String,
    pub sku: String,
    pub price_cents: u64,
    pub available: bool,
}

/// A material the customer can pick for a jewelry type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialOption {
    pub id: String,
    pub name: String,
    pub jewelry_type: String,
    pub price_modifier_cents: i64,
    pub swatch_url: Option<String>,
}

/// Read-only provider of catalog data
///
/// Synchronous on purpose: implementations read from an in-process snapshot
/// of the catalog, never from the network.
pub trait CatalogSource: Send + Sync {
    fn fetch_variants(&self, product_id: &str) -> Result<Vec<Variant>>;

    fn fetch_material_options(&self, jewelry_type: &str) -> Result<Vec<MaterialOption>>;
}

/// Cache-through access to a [`CatalogSource`]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    cache: Arc<TieredCacheManager>,
    governor: Arc<PerformanceGovernor>,
}

impl CatalogService {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        cache: Arc<TieredCacheManager>,
        governor: Arc<PerformanceGovernor>,
    ) -> Self {
        Self {
            source,
            cache,
            governor,
        }
    }

    /// Variants for a product, from the `variants` cache when fresh
    pub async fn variants(&self, product_id: &str) -> Result<Vec<Variant>> {
        let timer = self.governor.start("fetchVariants");

        if let Some(variants) = self
            .cache
            .get_as::<Vec<Variant>>(CacheCategory::Variants, product_id)
            .await
        {
            timer.finish(200, true);
            return Ok(variants);
        }

        match self.source.fetch_variants(product_id) {
            Ok(variants) => {
                debug!("Loaded {} variants for {}", variants.len(), product_id);
                self.cache
                    .put_value(CacheCategory::Variants, product_id, &variants)
                    .await;
                timer.finish(200, false);
                Ok(variants)
            }
            Err(e) => {
                timer.finish(e.status_code(), false);
                Err(e)
            }
        }
    }

    /// Material options for a jewelry type, from the `materials` cache when fresh
    pub async fn material_options(&self, jewelry_type: &str) -> Result<Vec<MaterialOption>> {
        let timer = self.governor.start("fetchMaterialOptions");

        if let Some(options) = self
            .cache
            .get_as::<Vec<MaterialOption>>(CacheCategory::Materials, jewelry_type)
            .await
        {
            timer.finish(200, true);
            return Ok(options);
        }

        match self.source.fetch_material_options(jewelry_type) {
            Ok(options) => {
                debug!("Loaded {} material options for {}", options.len(), jewelry_type);
                self.cache
                    .put_value(CacheCategory::Materials, jewelry_type, &options)
                    .await;
                timer.finish(200, false);
                Ok(options)
            }
            Err(e) => {
                timer.finish(e.status_code(), false);
                Err(e)
            }
        }
    }
}
