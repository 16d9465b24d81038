use serde::Serialize;

use crate::domain::{EndUseCategory, FlexibilityTier, IntervalSeries, Scenario, TierWindows};
use crate::optimizer::{
    differential, OptimizerError, OptimizerResult, ShedSolver, ShiftPenalty, ShiftSolver,
};

/// MOER is in lb CO2 / MWh and load in kWh
const KWH_PER_MWH: f64 = 1000.0;

/// Emissions avoided by replacing `load` with `new_load`.
///
/// Negative when the new curve emits more; never clamped.
pub fn emissions_savings(
    emissions: &IntervalSeries,
    load: &IntervalSeries,
    new_load: &IntervalSeries,
) -> f64 {
    emissions
        .as_slice()
        .iter()
        .zip(load.as_slice().iter().zip(new_load.as_slice()))
        .map(|(e, (l, n))| e * (l - n))
        .sum::<f64>()
        / KWH_PER_MWH
}

/// Position of one savings cell in the output tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub scenario: Scenario,
    pub tier: FlexibilityTier,
    /// Row: index into the dataset's days
    pub day: usize,
    /// Column: index into the planned end-uses of the scenario
    pub column: usize,
}

/// A cell that produced no savings value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFailure {
    pub scenario: Scenario,
    pub tier: FlexibilityTier,
    pub date: String,
    pub end_use: String,
    pub error: String,
}

/// Picks the solver for a (scenario, category, tier) and evaluates one day
#[derive(Debug, Clone, Copy)]
pub struct CellEvaluator {
    windows: TierWindows,
    penalty: ShiftPenalty,
}

impl CellEvaluator {
    pub fn new(windows: TierWindows, penalty: ShiftPenalty) -> Self {
        Self { windows, penalty }
    }

    pub fn windows(&self) -> &TierWindows {
        &self.windows
    }

    pub fn optimize(
        &self,
        scenario: Scenario,
        category: &EndUseCategory,
        tier: FlexibilityTier,
        proportion: f64,
        emissions: &IntervalSeries,
        load: &IntervalSeries,
    ) -> OptimizerResult<IntervalSeries> {
        let window = self.windows.window(tier);
        match scenario {
            Scenario::Shift => {
                let diff = differential(emissions, category.differential_window(tier, &self.windows))?;
                ShiftSolver::new(category.shift_variant(), self.penalty)
                    .solve(emissions, load, &diff, proportion, window)
            }
            Scenario::Shed => ShedSolver.solve(emissions, load, proportion, window),
        }
    }

    pub fn savings(
        &self,
        scenario: Scenario,
        category: &EndUseCategory,
        tier: FlexibilityTier,
        proportion: f64,
        emissions: &IntervalSeries,
        load: &IntervalSeries,
    ) -> OptimizerResult<f64> {
        let new_load = self.optimize(scenario, category, tier, proportion, emissions, load)?;
        let savings = emissions_savings(emissions, load, &new_load);
        if !savings.is_finite() {
            return Err(OptimizerError::SolverNonConvergence(format!(
                "non-finite savings {savings}"
            )));
        }
        Ok(savings)
    }
}
