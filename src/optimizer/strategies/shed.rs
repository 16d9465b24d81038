//! Load shed optimizer
//!
//! Curtails a fixed proportion of load inside the dirtiest contiguous window
//! of the day. Shed energy is not recovered elsewhere.

use std::ops::Range;

use tracing::{instrument, trace};

use crate::domain::IntervalSeries;
use crate::optimizer::differential::argmax_first;
use crate::optimizer::error::{ensure_proportion, ensure_series, ensure_window};
use crate::optimizer::{OptimizerError, OptimizerResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShedSolver;

impl ShedSolver {
    /// Window of `window` intervals with the highest emissions sum.
    /// Ties resolve to the earliest start.
    pub fn select_window(emissions: &IntervalSeries, window: usize) -> OptimizerResult<Range<usize>> {
        ensure_window(window)?;
        let n = ensure_series(&[("emissions", emissions)])?;
        if window >= n {
            return Err(OptimizerError::MalformedInput(format!(
                "shed window of {window} intervals does not fit a day of {n} intervals"
            )));
        }

        let rolling: Vec<f64> = emissions
            .as_slice()
            .windows(window)
            .map(|w| w.iter().sum())
            .collect();
        let start = argmax_first(&rolling)
            .ok_or_else(|| OptimizerError::MalformedInput("no shed window".to_string()))?;
        Ok(start..start + window)
    }

    #[instrument(skip_all, fields(proportion, window))]
    pub fn solve(
        &self,
        emissions: &IntervalSeries,
        load: &IntervalSeries,
        proportion: f64,
        window: usize,
    ) -> OptimizerResult<IntervalSeries> {
        ensure_series(&[("emissions", emissions), ("load", load)])?;
        ensure_proportion(proportion)?;
        let shed = Self::select_window(emissions, window)?;
        trace!(start = shed.start, end = shed.end, "shed window selected");

        let keep = 1.0 - proportion;
        let new_load = load
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &l)| if shed.contains(&i) { keep * l } else { l })
            .collect();
        Ok(IntervalSeries::new(new_load))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_shed_literal() {
        let emissions = IntervalSeries::from(vec![1.0, 1.0, 9.0, 9.0, 1.0, 1.0]);
        let load = IntervalSeries::from(vec![2.0; 6]);

        assert_eq!(ShedSolver::select_window(&emissions, 2).unwrap(), 2..4);
        let new_load = ShedSolver.solve(&emissions, &load, 0.5, 2).unwrap();
        assert_eq!(new_load.as_slice(), &[2.0, 2.0, 1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_last_window_is_eligible() {
        let emissions = IntervalSeries::from(vec![1.0, 1.0, 1.0, 5.0]);
        assert_eq!(ShedSolver::select_window(&emissions, 2).unwrap(), 2..4);
    }

    #[test]
    fn test_tie_selects_earliest_window() {
        let emissions = IntervalSeries::from(vec![3.0, 3.0, 3.0, 3.0]);
        assert_eq!(ShedSolver::select_window(&emissions, 1).unwrap(), 0..1);
    }

    #[test]
    fn test_rejects_window_not_shorter_than_day() {
        let emissions = IntervalSeries::from(vec![1.0, 2.0, 3.0]);
        let load = IntervalSeries::from(vec![1.0; 3]);
        let err = ShedSolver.solve(&emissions, &load, 0.5, 3).unwrap_err();
        assert!(matches!(err, OptimizerError::MalformedInput(_)));
        assert!(ShedSolver.solve(&emissions, &load, 0.5, 0).is_err());
        assert!(ShedSolver.solve(&emissions, &load, -0.5, 1).is_err());
    }

    proptest! {
        #[test]
        fn prop_shed_is_monotone(
            (moer, base) in (3usize..100).prop_flat_map(|n| (
                prop::collection::vec(0.0f64..1500.0, n),
                prop::collection::vec(0.0f64..10.0, n),
            )),
            proportion in 0.0f64..=1.0,
            window in 1usize..3,
        ) {
            let emissions = IntervalSeries::from(moer);
            let load = IntervalSeries::from(base);
            let shed = ShedSolver::select_window(&emissions, window).unwrap();
            let new_load = ShedSolver.solve(&emissions, &load, proportion, window).unwrap();

            for i in 0..load.len() {
                prop_assert!(new_load[i] <= load[i]);
                if shed.contains(&i) {
                    prop_assert_eq!(new_load[i], (1.0 - proportion) * load[i]);
                } else {
                    prop_assert_eq!(new_load[i], load[i]);
                }
            }
        }
    }
}
