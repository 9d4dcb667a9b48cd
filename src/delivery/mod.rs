//! Adaptive asset delivery
//!
//! Picks the quality tier for a device/network context, turns it into an
//! ordered list of frame URLs, and loads them in two phases.
//!
//! A slow network always plans against the `mobile` tier table, whatever the
//! caller declared.

pub mod fetcher;
pub mod plan;
pub mod planner;
pub mod tier;

pub use fetcher::{AssetFetcher, HttpAssetFetcher};
pub use plan::{plan_tier, AssetPlan, PlanRequest};
pub use planner::{
    fetch_with_timeout, load_sequential, BackgroundReport, DeliveryPlanner, GenerationGuard,
    PlanLookup, PreloadOutcome,
};
pub use tier::{AssetFormat, DeviceClass, NetworkClass, QualityTier, TierSpec, TierTable};
