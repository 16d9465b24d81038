//! MOER differential preprocessing
//!
//! For every interval, how much dirtier it is than the cleanest interval in a
//! window around it. The index of the largest entry is the heuristic peak that
//! the shift solvers move load away from.

use super::error::{ensure_series, ensure_window, OptimizerResult};
use crate::domain::IntervalSeries;

/// `result[i] = emissions[i] - min(emissions[i - window .. i + window])`,
/// with the window clipped to the series and its upper end exclusive.
pub fn differential(emissions: &IntervalSeries, window: usize) -> OptimizerResult<IntervalSeries> {
    ensure_window(window)?;
    let n = ensure_series(&[("emissions", emissions)])?;
    let values = emissions.as_slice();

    let result = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(window);
            let hi = (i + window).min(n);
            let local_min = values[lo..hi].iter().copied().fold(f64::INFINITY, f64::min);
            values[i] - local_min
        })
        .collect::<Vec<_>>();

    Ok(IntervalSeries::new(result))
}

/// Index of the largest value; ties resolve to the first occurrence
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
