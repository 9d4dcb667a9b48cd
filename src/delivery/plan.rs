//! Pure planning: tier selection and URL generation
//!
//! URL shape is a contract with the asset origin:
//!
//! ```text
//! {baseUrl}/{configId}/{materialId}/{tierName}/frame_{NNN}.{format}
//! ```
//!
//! `NNN` is 1-based and zero-padded to the width of the tier's largest frame
//! count, never less than 3 digits.

use crate::delivery::tier::{DeviceClass, NetworkClass, QualityTier, TierSpec, TierTable};
use crate::error::{DeliveryError, Result};
use serde::{Deserialize, Serialize};

const MIN_FRAME_DIGITS: usize = 3;

/// Inputs for a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanRequest {
    pub config_id: String,
    pub material_id: String,
    /// Declared device; `None` means unknown
    pub device: Option<DeviceClass>,
    pub network: NetworkClass,
    pub tier: QualityTier,
}

impl PlanRequest {
    /// Request the immediate tier on a fast network with no declared device
    pub fn new(config_id: impl Into<String>, material_id: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            material_id: material_id.into(),
            device: None,
            network: NetworkClass::Fast,
            tier: QualityTier::Immediate,
        }
    }

    pub fn device(mut self, device: DeviceClass) -> Self {
        self.device = Some(device);
        self
    }

    pub fn network(mut self, network: NetworkClass) -> Self {
        self.network = network;
        self
    }

    pub fn tier(mut self, tier: QualityTier) -> Self {
        self.tier = tier;
        self
    }

    /// Device class used for the tier lookup
    pub fn effective_device(&self) -> DeviceClass {
        DeviceClass::effective(self.device, self.network)
    }

    /// Key shared by all preloads of the same configuration and material
    pub fn sequence_key(&self) -> (String, String) {
        (self.config_id.clone(), self.material_id.clone())
    }

    /// Identifier of the cached plan for this request
    pub fn cache_identifier(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.config_id,
            self.material_id,
            self.tier,
            self.effective_device()
        )
    }
}

/// Ordered asset URLs for one configuration, material and tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPlan {
    pub config_id: String,
    pub material_id: String,
    pub tier: QualityTier,
    pub effective_device: DeviceClass,
    pub spec: TierSpec,
    pub urls: Vec<String>,
}

impl AssetPlan {
    pub fn frame_count(&self) -> usize {
        self.urls.len()
    }

    /// Split into the eager batch and the background remainder
    pub fn split_eager(&self, eager_frames: usize) -> (&[String], &[String]) {
        let eager = eager_frames.min(self.urls.len());
        self.urls.split_at(eager)
    }
}

/// Build the plan for a request
///
/// Deterministic: identical inputs yield identical URL lists. A malformed
/// identifier or a missing table entry is [`DeliveryError::NoTierFound`].
pub fn plan_tier(table: &TierTable, base_url: &str, request: &PlanRequest) -> Result<AssetPlan> {
    let device = request.effective_device();
    let not_found = || DeliveryError::NoTierFound {
        config_id: request.config_id.clone(),
        material_id: request.material_id.clone(),
        tier: request.tier.to_string(),
        device: device.to_string(),
    };

    if !is_valid_segment(&request.config_id) || !is_valid_segment(&request.material_id) {
        return Err(not_found());
    }

    let spec = *table.get(device, request.tier).ok_or_else(not_found)?;
    if spec.frame_count == 0 {
        return Err(not_found());
    }

    let width = frame_digits(table.max_frame_count(request.tier).unwrap_or(spec.frame_count));
    let base = base_url.trim_end_matches('/');

    let urls = (1..=spec.frame_count)
        .map(|frame| {
            frame_url(
                base,
                &request.config_id,
                &request.material_id,
                request.tier,
                frame,
                width,
                &spec,
            )
        })
        .collect();

    Ok(AssetPlan {
        config_id: request.config_id.clone(),
        material_id: request.material_id.clone(),
        tier: request.tier,
        effective_device: device,
        spec,
        urls,
    })
}

fn frame_url(
    base: &str,
    config_id: &str,
    material_id: &str,
    tier: QualityTier,
    frame: u32,
    width: usize,
    spec: &TierSpec,
) -> String {
    format!(
        "{}/{}/{}/{}/frame_{:0width$}.{}",
        base,
        config_id,
        material_id,
        tier.as_str(),
        frame,
        spec.format.extension(),
        width = width
    )
}

/// Zero-pad width for a frame count
pub fn frame_digits(max_frame_count: u32) -> usize {
    max_frame_count.to_string().len().max(MIN_FRAME_DIGITS)
}

/// Identifiers become path segments, so they must be non-empty and free of
/// separators, whitespace and control characters
fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| !c.is_whitespace() && !c.is_control() && !matches!(c, '/' | '\\' | '?' | '#'))
}
