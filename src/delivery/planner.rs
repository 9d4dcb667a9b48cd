//! Adaptive delivery planner: cached plans and two-phase preloading
//!
//! # Two-phase load
//!
//! ```text
//! preload_assets ──► eager batch (concurrent, all-or-nothing) ──► return
//!                                                     │
//!                                                     └──► background (sequential,
//!                                                          skip on failure,
//!                                                          stops when superseded)
//! ```
//!
//! Each `(config_id, material_id)` pair has a generation counter. A new
//! preload bumps it; an older background loop sees the mismatch before its
//! next request and stops. Requests already in flight are left to finish.

use crate::cache::{CacheCategory, TieredCacheManager};
use crate::config::DeliveryConfig;
use crate::delivery::fetcher::AssetFetcher;
use crate::delivery::plan::{plan_tier, AssetPlan, PlanRequest};
use crate::delivery::tier::TierTable;
use crate::error::{DeliveryError, Result};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type SequenceKey = (String, String);
type Generations = Arc<DashMap<SequenceKey, Arc<AtomicU64>>>;

/// Handle to one preload generation of a sequence
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    counter: Arc<AtomicU64>,
    generation: u64,
}

impl GenerationGuard {
    /// A standalone guard that is never superseded
    pub fn detached() -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(1)),
            generation: 1,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer preload has started for the same sequence
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.generation
    }
}

/// A plan and whether it came from the sequence cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLookup {
    pub plan: AssetPlan,
    pub from_cache: bool,
}

/// What happened in a background phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackgroundReport {
    /// URLs that loaded, in request order
    pub loaded: Vec<String>,
    /// URLs that failed or timed out, in request order
    pub skipped: Vec<String>,
    /// Whether a newer preload stopped this loop early
    pub superseded: bool,
}

impl BackgroundReport {
    pub fn attempted(&self) -> usize {
        self.loaded.len() + self.skipped.len()
    }
}

/// Result of a successful eager phase
#[derive(Debug)]
pub struct PreloadOutcome {
    pub plan: AssetPlan,
    pub from_cache: bool,
    pub eager_loaded: usize,
    pub background_scheduled: usize,
    pub generation: u64,
    /// Running background phase, `None` when the eager batch covered every frame
    pub background: Option<JoinHandle<BackgroundReport>>,
}

/// Chooses tiers, builds URL plans and drives preloading
pub struct DeliveryPlanner {
    table: TierTable,
    base_url: String,
    eager_frames: usize,
    request_timeout: Duration,
    cache: Arc<TieredCacheManager>,
    fetcher: Arc<dyn AssetFetcher>,
    generations: Generations,
}

impl DeliveryPlanner {
    /// Create a planner using the standard tier table
    pub fn new(
        config: &DeliveryConfig,
        cache: Arc<TieredCacheManager>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self {
            table: TierTable::standard(),
            base_url: config.normalized_base_url().to_string(),
            eager_frames: config.eager_frames.max(1),
            request_timeout: config.request_timeout,
            cache,
            fetcher,
            generations: Arc::new(DashMap::new()),
        }
    }

    /// Replace the tier table
    pub fn with_table(mut self, table: TierTable) -> Self {
        self.table = table;
        self
    }

    pub fn table(&self) -> &TierTable {
        &self.table
    }

    /// Build the plan for a request without touching the cache
    pub fn plan_tier(&self, request: &PlanRequest) -> Result<AssetPlan> {
        plan_tier(&self.table, &self.base_url, request)
    }

    /// Plan via the sequence cache, populating it on a miss
    pub async fn lookup_plan(&self, request: &PlanRequest) -> Result<PlanLookup> {
        let identifier = request.cache_identifier();

        if let Some(plan) = self
            .cache
            .get_as::<AssetPlan>(CacheCategory::Sequences, &identifier)
            .await
        {
            if self.is_usable(&plan, request) {
                return Ok(PlanLookup {
                    plan,
                    from_cache: true,
                });
            }
            debug!("Discarding cached plan built for another origin: {}", identifier);
        }

        let plan = self.plan_tier(request)?;
        self.cache
            .put_value(CacheCategory::Sequences, &identifier, &plan)
            .await;

        Ok(PlanLookup {
            plan,
            from_cache: false,
        })
    }

    fn is_usable(&self, plan: &AssetPlan, request: &PlanRequest) -> bool {
        plan.tier == request.tier
            && plan.effective_device == request.effective_device()
            && !plan.urls.is_empty()
            && plan
                .urls
                .iter()
                .all(|url| url.starts_with(&format!("{}/", self.base_url)))
    }

    /// Start a new generation for a sequence, superseding any running one
    pub fn begin_generation(&self, config_id: &str, material_id: &str) -> GenerationGuard {
        // Increment while the entry is held; release takes the same shard lock
        let entry = self
            .generations
            .entry((config_id.to_string(), material_id.to_string()))
            .or_insert_with(|| Arc::new(AtomicU64::new(0)));
        let generation = entry.fetch_add(1, Ordering::AcqRel) + 1;
        let counter = Arc::clone(entry.value());

        GenerationGuard {
            counter,
            generation,
        }
    }

    /// Load the eager batch, then continue the rest in the background
    ///
    /// Returns once the eager batch has settled. Fails if any eager frame
    /// fails; background failures are skipped and never reported as errors.
    pub async fn preload_assets(&self, request: &PlanRequest) -> Result<PreloadOutcome> {
        let PlanLookup { plan, from_cache } = self.lookup_plan(request).await?;
        let guard = self.begin_generation(&request.config_id, &request.material_id);
        let key = request.sequence_key();

        let (eager, rest) = plan.split_eager(self.eager_frames);
        info!(
            config_id = %request.config_id,
            material_id = %request.material_id,
            tier = %plan.tier,
            device = %plan.effective_device,
            generation = guard.generation(),
            "Preloading {} eager + {} background frames",
            eager.len(),
            rest.len()
        );

        let results = join_all(
            eager
                .iter()
                .map(|url| fetch_with_timeout(self.fetcher.as_ref(), url, self.request_timeout)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            for (url, result) in eager.iter().zip(&results) {
                if let Err(e) = result {
                    warn!("Eager frame failed {}: {}", url, e);
                }
            }
            release_generation(&self.generations, &key, guard.generation());
            return Err(DeliveryError::EagerPhaseFailed {
                failed,
                attempted: eager.len(),
            });
        }

        let eager_loaded = eager.len();
        let background_scheduled = rest.len();
        let generation = guard.generation();

        let background = if rest.is_empty() {
            release_generation(&self.generations, &key, generation);
            None
        } else {
            let fetcher = Arc::clone(&self.fetcher);
            let urls = rest.to_vec();
            let timeout = self.request_timeout;
            let generations = Arc::clone(&self.generations);

            Some(tokio::spawn(async move {
                let report = load_sequential(fetcher.as_ref(), &urls, timeout, &guard).await;
                release_generation(&generations, &key, generation);
                report
            }))
        };

        Ok(PreloadOutcome {
            plan,
            from_cache,
            eager_loaded,
            background_scheduled,
            generation,
            background,
        })
    }

    /// Number of sequences with a live generation counter
    pub fn active_sequences(&self) -> usize {
        self.generations.len()
    }
}

/// Fetch one URL within `timeout`
pub async fn fetch_with_timeout(
    fetcher: &dyn AssetFetcher,
    url: &str,
    timeout: Duration,
) -> Result<u64> {
    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
            url: url.to_string(),
        }),
    }
}

/// Request `urls` one at a time, skipping failures
///
/// Each attempt settles before the next starts. The guard is checked before
/// every request; once stale, no further requests are issued.
pub async fn load_sequential(
    fetcher: &dyn AssetFetcher,
    urls: &[String],
    timeout: Duration,
    guard: &GenerationGuard,
) -> BackgroundReport {
    let mut report = BackgroundReport::default();

    for url in urls {
        if !guard.is_current() {
            debug!(
                "Background phase superseded after {} of {} frames",
                report.attempted(),
                urls.len()
            );
            report.superseded = true;
            break;
        }

        match fetch_with_timeout(fetcher, url, timeout).await {
            Ok(_) => report.loaded.push(url.clone()),
            Err(e) => {
                warn!("Skipping background frame {}: {}", url, e);
                report.skipped.push(url.clone());
            }
        }
    }

    debug!(
        "Background phase finished: {} loaded, {} skipped",
        report.loaded.len(),
        report.skipped.len()
    );
    report
}

fn release_generation(generations: &Generations, key: &SequenceKey, generation: u64) {
    generations.remove_if(key, |_, counter| counter.load(Ordering::Acquire) == generation);
}
