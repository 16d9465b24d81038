use serde::{Deserialize, Serialize};
use strum::Display;
use validator::Validate;

/// Shape of the feasible band around the baseline curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ShiftVariant {
    /// Load may move anywhere within the window, energy neutral
    Symmetric,
    /// Shifting costs an efficiency loss proportional to the displacement
    Penalized,
    /// As `Penalized`, but load may only reappear at or after the peak
    ForwardOnly,
}

/// Efficiency loss charged for moving energy in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShiftPenalty {
    /// Fractional loss per hour of displacement (0.05 = 5%)
    #[validate(range(min = 0.0))]
    pub rate_per_hour: f64,
    #[validate(range(min = 1))]
    pub intervals_per_hour: usize,
}

impl Default for ShiftPenalty {
    fn default() -> Self {
        Self {
            rate_per_hour: 0.05,
            intervals_per_hour: 4,
        }
    }
}

impl ShiftPenalty {
    /// `1 + rate * distance / intervals_per_hour`
    pub fn factor(&self, distance: usize) -> f64 {
        1.0 + self.rate_per_hour * distance as f64 / self.intervals_per_hour as f64
    }
}

/// Per-interval bounds and conservation weights of one shift LP.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleBand {
    pub peak: usize,
    /// Absolute energy that may leave the peak interval
    pub shiftable: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// `Σ w[i]·new[i] == Σ w[i]·load[i]`
    pub weights: Vec<f64>,
}

impl FeasibleBand {
    /// Builds the band for `variant` around `load`.
    ///
    /// Only the peak may drop, by `shiftable`. Intervals inside the window may
    /// rise; the peak itself never receives extra load. Penalized variants
    /// inflate the allowance by the displacement factor and weight every
    /// interval of the conservation equality by its inverse, inside the
    /// window or not.
    pub fn build(
        variant: ShiftVariant,
        load: &[f64],
        peak: usize,
        proportion: f64,
        window: usize,
        penalty: &ShiftPenalty,
    ) -> Self {
        let n = load.len();
        let shiftable = proportion * load[peak];

        let mut lower = load.to_vec();
        lower[peak] -= shiftable;

        let first = match variant {
            ShiftVariant::Symmetric | ShiftVariant::Penalized => peak.saturating_sub(window),
            ShiftVariant::ForwardOnly => peak,
        };
        let last = (peak + window).min(n - 1);

        let mut upper = load.to_vec();
        for (i, bound) in upper.iter_mut().enumerate().take(last + 1).skip(first) {
            if i == peak {
                continue;
            }
            let inflation = match variant {
                ShiftVariant::Symmetric => 1.0,
                ShiftVariant::Penalized | ShiftVariant::ForwardOnly => {
                    penalty.factor(i.abs_diff(peak))
                }
            };
            *bound += shiftable * inflation;
        }

        let weights = match variant {
            ShiftVariant::Symmetric => vec![1.0; n],
            ShiftVariant::Penalized | ShiftVariant::ForwardOnly => {
                (0..n).map(|i| 1.0 / penalty.factor(i.abs_diff(peak))).collect()
            }
        };

        Self {
            peak,
            shiftable,
            lower,
            upper,
            weights,
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn is_fixed(&self, i: usize) -> bool {
        self.lower[i] == self.upper[i]
    }

    /// Right-hand side of the conservation equality
    pub fn conserved_quantity(&self, load: &[f64]) -> f64 {
        self.weights.iter().zip(load).map(|(w, l)| w * l).sum()
    }

    /// Whether `curve` lies inside the band, up to `tolerance`
    pub fn contains(&self, curve: &[f64], tolerance: f64) -> bool {
        curve.len() == self.len()
            && curve
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&v, (&lo, &hi))| v >= lo - tolerance && v <= hi + tolerance)
    }
}
