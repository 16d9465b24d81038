use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FlexibilityTier, TierWindows};
use crate::optimizer::ShiftVariant;

/// End-use category as named in the assumption table.
///
/// The category decides which shift formulation is used and whether the
/// end-use takes part in the wider-window tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndUseCategory {
    Hvac,
    HotWater,
    Refrigeration,
    Lighting,
    Other(String),
}

impl EndUseCategory {
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "HVAC" => Self::Hvac,
            "Hot Water" => Self::HotWater,
            "Refrigeration" => Self::Refrigeration,
            "Lighting" => Self::Lighting,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Hvac => "HVAC",
            Self::HotWater => "Hot Water",
            Self::Refrigeration => "Refrigeration",
            Self::Lighting => "Lighting",
            Self::Other(name) => name,
        }
    }

    /// Shift formulation for this category.
    ///
    /// HVAC and water heating pay an efficiency penalty for shifting;
    /// refrigeration additionally may only move load forward in time.
    pub fn shift_variant(&self) -> ShiftVariant {
        match self {
            Self::Hvac | Self::HotWater => ShiftVariant::Penalized,
            Self::Refrigeration => ShiftVariant::ForwardOnly,
            Self::Lighting | Self::Other(_) => ShiftVariant::Symmetric,
        }
    }

    /// Window used to compute the differential series that locates the peak.
    ///
    /// Symmetric-shift categories locate their single-interval peak with the
    /// low tier's differential.
    pub fn differential_window(&self, tier: FlexibilityTier, windows: &TierWindows) -> usize {
        match (self.shift_variant(), tier) {
            (ShiftVariant::Symmetric, FlexibilityTier::Small) => windows.low,
            _ => windows.window(tier),
        }
    }

    /// Whether the category is simulated for the given shift tier.
    /// Lighting is only shiftable by a single interval.
    pub fn shifts_at(&self, tier: FlexibilityTier) -> bool {
        !matches!(self, Self::Lighting) || tier == FlexibilityTier::Small
    }
}

impl From<String> for EndUseCategory {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<EndUseCategory> for String {
    fn from(category: EndUseCategory) -> Self {
        category.name().to_string()
    }
}

impl fmt::Display for EndUseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
