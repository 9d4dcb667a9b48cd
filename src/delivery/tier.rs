//! Quality tiers, device and network classes, and the static tier table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Fidelity level of a frame sequence, ordered by size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityTier {
    /// Shown as soon as a material is selected
    Immediate,

    /// Loaded once the user starts rotating the model
    OnInteraction,

    /// Full fidelity, only when explicitly requested
    OnDemand,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [
        QualityTier::Immediate,
        QualityTier::OnInteraction,
        QualityTier::OnDemand,
    ];

    /// Name used in asset URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Immediate => "immediate",
            QualityTier::OnInteraction => "onInteraction",
            QualityTier::OnDemand => "onDemand",
        }
    }

    /// Parse a tier name, case-insensitively, accepting `on-demand` style too
    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "immediate" => Some(QualityTier::Immediate),
            "oninteraction" => Some(QualityTier::OnInteraction),
            "ondemand" => Some(QualityTier::OnDemand),
            _ => None,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared device capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
    HighEnd,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 3] = [DeviceClass::Mobile, DeviceClass::Desktop, DeviceClass::HighEnd];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
            DeviceClass::HighEnd => "highEnd",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "mobile" => Some(DeviceClass::Mobile),
            "desktop" => Some(DeviceClass::Desktop),
            "highend" => Some(DeviceClass::HighEnd),
            _ => None,
        }
    }

    /// Device class used for the tier lookup
    ///
    /// A slow network always resolves to `Mobile` so the smallest payload is
    /// used. Otherwise the declared class wins, `Desktop` when undeclared.
    pub fn effective(declared: Option<DeviceClass>, network: NetworkClass) -> DeviceClass {
        if network == NetworkClass::Slow {
            DeviceClass::Mobile
        } else {
            declared.unwrap_or_default()
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed connection quality, supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkClass {
    #[default]
    Fast,
    Medium,
    Slow,
}

impl NetworkClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkClass::Fast => "fast",
            NetworkClass::Medium => "medium",
            NetworkClass::Slow => "slow",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match normalize(name).as_str() {
            "fast" => Some(NetworkClass::Fast),
            "medium" => Some(NetworkClass::Medium),
            "slow" => Some(NetworkClass::Slow),
            _ => None,
        }
    }

    /// Map a browser `effectiveType` connection signal (`4g`, `3g`, `2g`,
    /// `slow-2g`) to a network class. Unknown signals are treated as fast.
    pub fn from_effective_type(effective_type: &str) -> Self {
        match effective_type.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "2g" => NetworkClass::Slow,
            "3g" => NetworkClass::Medium,
            _ => NetworkClass::Fast,
        }
    }
}

impl fmt::Display for NetworkClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Image encoding of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    Webp,
    Jpg,
    Png,
}

impl AssetFormat {
    /// File extension used in URLs
    pub fn extension(&self) -> &'static str {
        match self {
            AssetFormat::Webp => "webp",
            AssetFormat::Jpg => "jpg",
            AssetFormat::Png => "png",
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Static description of one tier on one device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSpec {
    pub frame_count: u32,
    pub approx_byte_size: u64,
    pub format: AssetFormat,
    pub target_load_time_ms: u64,
}

impl TierSpec {
    pub const fn new(
        frame_count: u32,
        approx_byte_size: u64,
        format: AssetFormat,
        target_load_time_ms: u64,
    ) -> Self {
        Self {
            frame_count,
            approx_byte_size,
            format,
            target_load_time_ms,
        }
    }
}

/// Lookup table from `(device, tier)` to [`TierSpec`]
///
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct TierTable {
    specs: HashMap<(DeviceClass, QualityTier), TierSpec>,
}

impl TierTable {
    /// The production tier table
    pub fn standard() -> Self {
        use AssetFormat::*;
        use DeviceClass::*;
        use QualityTier::*;

        Self::from_specs([
            ((Mobile, Immediate), TierSpec::new(8, 160_000, Webp, 300)),
            ((Mobile, OnInteraction), TierSpec::new(24, 640_000, Webp, 1_200)),
            ((Mobile, OnDemand), TierSpec::new(36, 1_600_000, Webp, 3_000)),
            ((Desktop, Immediate), TierSpec::new(12, 320_000, Webp, 300)),
            ((Desktop, OnInteraction), TierSpec::new(36, 1_280_000, Webp, 1_000)),
            ((Desktop, OnDemand), TierSpec::new(72, 4_200_000, Jpg, 2_500)),
            ((HighEnd, Immediate), TierSpec::new(16, 520_000, Webp, 250)),
            ((HighEnd, OnInteraction), TierSpec::new(48, 2_100_000, Webp, 800)),
            ((HighEnd, OnDemand), TierSpec::new(120, 9_600_000, Png, 2_000)),
        ])
    }

    /// Build a table from explicit entries
    pub fn from_specs<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = ((DeviceClass, QualityTier), TierSpec)>,
    {
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    /// Look up a spec
    pub fn get(&self, device: DeviceClass, tier: QualityTier) -> Option<&TierSpec> {
        self.specs.get(&(device, tier))
    }

    /// Largest frame count configured for a tier on any device
    pub fn max_frame_count(&self, tier: QualityTier) -> Option<u32> {
        self.specs
            .iter()
            .filter(|((_, t), _)| *t == tier)
            .map(|(_, spec)| spec.frame_count)
            .max()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::standard()
    }
}
