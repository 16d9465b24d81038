use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use validator::Validate;

/// Preset window-length/proportion configuration expressing increasing
/// willingness or ability to move load.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum FlexibilityTier {
    /// Single interval (15 min)
    #[strum(to_string = "small")]
    Small,
    /// 1 hour
    #[strum(to_string = "low")]
    Low,
    /// 2 hours
    #[strum(to_string = "med", serialize = "medium")]
    Medium,
    /// 4 hours
    #[strum(to_string = "high")]
    High,
}

impl FlexibilityTier {
    pub fn all() -> impl Iterator<Item = FlexibilityTier> {
        Self::iter()
    }
}

/// Shiftable or shedable proportion per tier for one end-use.
///
/// The assumption table stores these as a positional 4-element array
/// `[small, low, medium, high]`; the named fields remove positional indexing
/// from the rest of the code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct FlexibilityProfile {
    pub small: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl FlexibilityProfile {
    pub fn proportion(&self, tier: FlexibilityTier) -> f64 {
        match tier {
            FlexibilityTier::Small => self.small,
            FlexibilityTier::Low => self.low,
            FlexibilityTier::Medium => self.medium,
            FlexibilityTier::High => self.high,
        }
    }
}

impl From<[f64; 4]> for FlexibilityProfile {
    fn from([small, low, medium, high]: [f64; 4]) -> Self {
        Self {
            small,
            low,
            medium,
            high,
        }
    }
}

impl From<FlexibilityProfile> for [f64; 4] {
    fn from(p: FlexibilityProfile) -> Self {
        [p.small, p.low, p.medium, p.high]
    }
}

/// Window length, in intervals, of each tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TierWindows {
    #[validate(range(min = 1))]
    pub small: usize,
    #[validate(range(min = 1))]
    pub low: usize,
    #[validate(range(min = 1))]
    pub medium: usize,
    #[validate(range(min = 1))]
    pub high: usize,
}

impl TierWindows {
    pub fn window(&self, tier: FlexibilityTier) -> usize {
        match tier {
            FlexibilityTier::Small => self.small,
            FlexibilityTier::Low => self.low,
            FlexibilityTier::Medium => self.medium,
            FlexibilityTier::High => self.high,
        }
    }
}

impl Default for TierWindows {
    fn default() -> Self {
        Self {
            small: 1,
            low: 4,
            medium: 8,
            high: 16,
        }
    }
}
