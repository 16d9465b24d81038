//! Load shift optimizer
//!
//! Moves part of the load at the emissions peak to cleaner intervals nearby by
//! solving a small linear program:
//!
//! ```text
//! minimise   Σ moer[i] · x[i]
//! subject to lower[i] <= x[i] <= upper[i]
//!            Σ w[i] · x[i] == Σ w[i] · load[i]
//! ```
//!
//! The baseline curve always satisfies every constraint, so a solver failure
//! is a defect and is reported as [`OptimizerError::SolverNonConvergence`].

use good_lp::{constraint, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use tracing::{debug, instrument, trace};

use crate::domain::IntervalSeries;
use crate::optimizer::differential::argmax_first;
use crate::optimizer::error::{ensure_proportion, ensure_series, ensure_window};
use crate::optimizer::{FeasibleBand, OptimizerError, OptimizerResult, ShiftPenalty, ShiftVariant};

/// Relative tolerance on the conservation equality of a returned curve
const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Optimized curve together with the band it was solved in
#[derive(Debug, Clone)]
pub struct ShiftSolution {
    pub new_load: IntervalSeries,
    /// `None` when nothing was shiftable and the baseline was returned as is
    pub band: Option<FeasibleBand>,
}

#[derive(Debug, Clone, Copy)]
pub struct ShiftSolver {
    variant: ShiftVariant,
    penalty: ShiftPenalty,
}

impl ShiftSolver {
    pub fn new(variant: ShiftVariant, penalty: ShiftPenalty) -> Self {
        Self { variant, penalty }
    }

    pub fn variant(&self) -> ShiftVariant {
        self.variant
    }

    /// Minimum-emissions rearrangement of `load`
    pub fn solve(
        &self,
        emissions: &IntervalSeries,
        load: &IntervalSeries,
        differential: &IntervalSeries,
        proportion: f64,
        window: usize,
    ) -> OptimizerResult<IntervalSeries> {
        self.solve_with_band(emissions, load, differential, proportion, window)
            .map(|solution| solution.new_load)
    }

    #[instrument(skip_all, fields(variant = %self.variant, proportion, window))]
    pub fn solve_with_band(
        &self,
        emissions: &IntervalSeries,
        load: &IntervalSeries,
        differential: &IntervalSeries,
        proportion: f64,
        window: usize,
    ) -> OptimizerResult<ShiftSolution> {
        ensure_series(&[
            ("emissions", emissions),
            ("load", load),
            ("differential", differential),
        ])?;
        ensure_proportion(proportion)?;
        ensure_window(window)?;

        let peak = argmax_first(differential.as_slice())
            .ok_or_else(|| OptimizerError::MalformedInput("empty differential".to_string()))?;

        let shiftable = proportion * load[peak];
        if shiftable <= 0.0 {
            debug!(peak, peak_load = load[peak], "nothing shiftable at peak");
            return Ok(ShiftSolution {
                new_load: load.clone(),
                band: None,
            });
        }

        let band = FeasibleBand::build(
            self.variant,
            load.as_slice(),
            peak,
            proportion,
            window,
            &self.penalty,
        );
        let new_load = solve_lp(emissions.as_slice(), load.as_slice(), &band)?;
        trace!(peak, shiftable, "shift solved");

        Ok(ShiftSolution {
            new_load: IntervalSeries::new(new_load),
            band: Some(band),
        })
    }
}

fn solve_lp(emissions: &[f64], load: &[f64], band: &FeasibleBand) -> OptimizerResult<Vec<f64>> {
    let mut problem = ProblemVariables::new();
    let x: Vec<Variable> = band
        .lower
        .iter()
        .zip(&band.upper)
        .map(|(&lo, &hi)| problem.add(variable().min(lo).max(hi)))
        .collect();

    let objective = x
        .iter()
        .zip(emissions)
        .map(|(&v, &moer)| v * moer)
        .sum::<Expression>();

    let conserved = band.conserved_quantity(load);
    let weighted = x
        .iter()
        .zip(&band.weights)
        .map(|(&v, &w)| v * w)
        .sum::<Expression>();

    let solution = problem
        .minimise(objective)
        .using(good_lp::solvers::minilp::minilp)
        .with(constraint!(weighted == conserved))
        .solve()
        .map_err(|e| OptimizerError::SolverNonConvergence(e.to_string()))?;

    // Snap solver noise back into the band; fixed intervals are returned exactly.
    let new_load: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if band.is_fixed(i) {
                band.lower[i]
            } else {
                solution.value(v).clamp(band.lower[i], band.upper[i])
            }
        })
        .collect();

    if new_load.iter().any(|v| !v.is_finite()) {
        return Err(OptimizerError::SolverNonConvergence(
            "solver returned a non-finite load".to_string(),
        ));
    }

    let achieved = band.conserved_quantity(&new_load);
    let tolerance = CONSERVATION_TOLERANCE * conserved.abs().max(1.0);
    if (achieved - conserved).abs() > tolerance {
        return Err(OptimizerError::SolverNonConvergence(format!(
            "energy not conserved: expected {conserved}, got {achieved}"
        )));
    }

    Ok(new_load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::differential::differential;
    use proptest::prelude::*;
    use rstest::rstest;

    fn solver(variant: ShiftVariant) -> ShiftSolver {
        ShiftSolver::new(variant, ShiftPenalty::default())
    }

    fn savings(emissions: &IntervalSeries, load: &IntervalSeries, new_load: &IntervalSeries) -> f64 {
        emissions
            .as_slice()
            .iter()
            .zip(load.as_slice().iter().zip(new_load.as_slice()))
            .map(|(e, (l, n))| e * (l - n))
            .sum::<f64>()
            / 1000.0
    }

    #[test]
    fn test_symmetric_shift_literal() {
        let emissions = IntervalSeries::from(vec![10.0, 50.0, 10.0, 10.0]);
        let load = IntervalSeries::from(vec![1.0, 1.0, 1.0, 1.0]);
        let diff = differential(&emissions, 1).unwrap();

        let solution = solver(ShiftVariant::Symmetric)
            .solve_with_band(&emissions, &load, &diff, 1.0, 1)
            .unwrap();
        let band = solution.band.unwrap();
        assert_eq!(band.peak, 1);

        let new_load = solution.new_load;
        assert!(new_load[1].abs() < 1e-9);
        assert_eq!(new_load[3], 1.0);
        assert!((new_load[0] + new_load[2] - 3.0).abs() < 1e-9);
        assert!((new_load.sum() - 4.0).abs() < 1e-9);
        assert!((savings(&emissions, &load, &new_load) - 0.04).abs() < 1e-9);
    }

    #[rstest]
    #[case(ShiftVariant::Symmetric)]
    #[case(ShiftVariant::Penalized)]
    #[case(ShiftVariant::ForwardOnly)]
    fn test_zero_proportion_is_noop(#[case] variant: ShiftVariant) {
        let emissions = IntervalSeries::from(vec![300.0, 900.0, 200.0, 400.0, 800.0]);
        let load = IntervalSeries::from(vec![0.3, 1.7, 0.2, 0.9, 1.1]);
        let diff = differential(&emissions, 2).unwrap();
        let new_load = solver(variant).solve(&emissions, &load, &diff, 0.0, 2).unwrap();
        assert_eq!(new_load, load);
    }

    #[rstest]
    #[case(ShiftVariant::Symmetric)]
    #[case(ShiftVariant::Penalized)]
    #[case(ShiftVariant::ForwardOnly)]
    fn test_rejects_malformed_input(#[case] variant: ShiftVariant) {
        let emissions = IntervalSeries::from(vec![1.0, 2.0, 3.0]);
        let load = IntervalSeries::from(vec![1.0, 1.0, 1.0]);
        let short = IntervalSeries::from(vec![1.0, 1.0]);
        let s = solver(variant);

        let err = s.solve(&emissions, &short, &emissions, 0.5, 1).unwrap_err();
        assert!(matches!(err, OptimizerError::MalformedInput(_)));
        let err = s.solve(&emissions, &load, &emissions, 1.5, 1).unwrap_err();
        assert!(matches!(err, OptimizerError::MalformedInput(_)));
        let err = s.solve(&emissions, &load, &emissions, 0.5, 0).unwrap_err();
        assert!(matches!(err, OptimizerError::MalformedInput(_)));
    }

    #[test]
    fn test_penalized_shift_respects_weighted_conservation() {
        let emissions = IntervalSeries::from(vec![
            200.0, 250.0, 300.0, 900.0, 950.0, 400.0, 150.0, 100.0, 500.0, 600.0,
        ]);
        let load = IntervalSeries::from(vec![1.0; 10]);
        let diff = differential(&emissions, 4).unwrap();

        let solution = solver(ShiftVariant::Penalized)
            .solve_with_band(&emissions, &load, &diff, 0.8, 4)
            .unwrap();
        let band = solution.band.unwrap();
        let new_load = solution.new_load;

        assert!(band.contains(new_load.as_slice(), 1e-9));
        let expected = band.conserved_quantity(load.as_slice());
        let achieved = band.conserved_quantity(new_load.as_slice());
        assert!((expected - achieved).abs() < 1e-6);
        assert!(new_load[band.peak] < load[band.peak]);
        assert!(savings(&emissions, &load, &new_load) > 0.0);
    }

    #[test]
    fn test_forward_only_never_moves_load_earlier() {
        // The cleanest interval lies before the peak, but refrigeration may
        // only recover load afterwards.
        let emissions = IntervalSeries::from(vec![100.0, 100.0, 900.0, 500.0, 400.0, 800.0]);
        let load = IntervalSeries::from(vec![2.0; 6]);
        let diff = differential(&emissions, 2).unwrap();

        let solution = solver(ShiftVariant::ForwardOnly)
            .solve_with_band(&emissions, &load, &diff, 0.5, 2)
            .unwrap();
        let band = solution.band.unwrap();
        assert_eq!(band.peak, 2);
        for i in 0..band.peak {
            assert_eq!(solution.new_load[i], load[i]);
        }
        assert!(solution.new_load[4] > load[4]);
    }

    #[test]
    fn test_zero_load_at_peak_returns_baseline() {
        let emissions = IntervalSeries::from(vec![100.0, 900.0, 100.0]);
        let load = IntervalSeries::from(vec![1.0, 0.0, 1.0]);
        let diff = differential(&emissions, 1).unwrap();
        let solution = solver(ShiftVariant::Symmetric)
            .solve_with_band(&emissions, &load, &diff, 1.0, 1)
            .unwrap();
        assert!(solution.band.is_none());
        assert_eq!(solution.new_load, load);
    }

    fn day() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
        (4usize..40).prop_flat_map(|n| {
            (
                prop::collection::vec(50.0f64..1500.0, n),
                prop::collection::vec(0.0f64..5.0, n),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_symmetric_shift_conserves_energy_within_band(
            (moer, base) in day(),
            proportion in 0.0f64..=1.0,
            window in 1usize..17,
        ) {
            let emissions = IntervalSeries::from(moer);
            let load = IntervalSeries::from(base);
            let diff = differential(&emissions, window).unwrap();
            let solution = solver(ShiftVariant::Symmetric)
                .solve_with_band(&emissions, &load, &diff, proportion, window)
                .unwrap();

            prop_assert!((solution.new_load.sum() - load.sum()).abs() < 1e-6 * load.sum().max(1.0));
            if let Some(band) = solution.band {
                prop_assert!(band.contains(solution.new_load.as_slice(), 1e-9));
            }
            // the baseline is feasible, so the optimum never emits more
            prop_assert!(savings(&emissions, &load, &solution.new_load) >= -1e-6);
        }

        #[test]
        fn prop_forward_only_leaves_earlier_intervals(
            (moer, base) in day(),
            proportion in 0.0f64..=1.0,
            window in 1usize..17,
        ) {
            let emissions = IntervalSeries::from(moer);
            let load = IntervalSeries::from(base);
            let diff = differential(&emissions, window).unwrap();
            let solution = solver(ShiftVariant::ForwardOnly)
                .solve_with_band(&emissions, &load, &diff, proportion, window)
                .unwrap();
            let peak = argmax_first(diff.as_slice()).unwrap();
            for i in 0..peak {
                prop_assert_eq!(solution.new_load[i], load[i]);
            }
        }
    }
}
