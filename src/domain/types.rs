use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use strum::{Display, EnumIter, EnumString};

use super::FlexibilityTier;

// ============================================================================
// Interval Series
// ============================================================================

/// One calendar day discretized into equal-length timesteps
/// (96 intervals of 15 minutes in the reference data).
///
/// Used for both the emissions intensity (MOER, lb CO2 / MWh) and the
/// baseline load of an end-use (kWh per interval).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalSeries(Vec<f64>);

impl IntervalSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Sum of pairwise products with another series of the same length
    pub fn dot(&self, other: &IntervalSeries) -> f64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }
}

impl From<Vec<f64>> for IntervalSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for IntervalSeries {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}

impl Index<usize> for IntervalSeries {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl fmt::Display for IntervalSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} intervals, Σ={:.3}]", self.len(), self.sum())
    }
}

// ============================================================================
// Run Dimensions
// ============================================================================

/// Load sector simulated by a run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sector {
    Residential,
    Commercial,
}

/// Kind of flexibility action
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scenario {
    /// Energy is moved within the day
    Shift,
    /// Energy is permanently curtailed within a window
    Shed,
}

impl Scenario {
    /// Tiers simulated for this scenario; shedding is not modelled at the
    /// single-interval tier.
    pub fn tiers(&self) -> &'static [FlexibilityTier] {
        match self {
            Scenario::Shift => &[
                FlexibilityTier::Small,
                FlexibilityTier::Low,
                FlexibilityTier::Medium,
                FlexibilityTier::High,
            ],
            Scenario::Shed => &[
                FlexibilityTier::Low,
                FlexibilityTier::Medium,
                FlexibilityTier::High,
            ],
        }
    }
}
