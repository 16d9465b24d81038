use std::collections::HashMap;

use crate::domain::{FlexibilityTier, Scenario};

/// Emissions saved per (day, end-use) for one scenario and tier.
///
/// Rows follow the order in which days appear in the input, columns the
/// order of the assumption table. `None` marks a cell whose solve failed.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySavingsTable {
    pub scenario: Scenario,
    pub tier: FlexibilityTier,
    pub days: Vec<String>,
    pub end_uses: Vec<String>,
    /// Column-major
    columns: Vec<Vec<Option<f64>>>,
}

impl DailySavingsTable {
    pub fn cell(&self, day: usize, column: usize) -> Option<f64> {
        self.columns.get(column)?.get(day).copied().flatten()
    }

    pub fn column(&self, end_use: &str) -> Option<&[Option<f64>]> {
        let idx = self.end_uses.iter().position(|e| e == end_use)?;
        Some(&self.columns[idx])
    }

    pub fn has_column(&self, end_use: &str) -> bool {
        self.end_uses.iter().any(|e| e == end_use)
    }

    /// Sum over all solved cells
    pub fn total(&self) -> f64 {
        self.columns.iter().flatten().flatten().sum()
    }

    pub fn missing_cells(&self) -> usize {
        self.columns.iter().flatten().filter(|c| c.is_none()).count()
    }
}

/// Accumulates cell results into a [`DailySavingsTable`].
///
/// Columns are registered up front so an end-use appears even when all of
/// its cells failed.
#[derive(Debug, Clone)]
pub struct SavingsTableBuilder {
    scenario: Scenario,
    tier: FlexibilityTier,
    days: Vec<String>,
    end_uses: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<Option<f64>>>,
}

impl SavingsTableBuilder {
    pub fn new(scenario: Scenario, tier: FlexibilityTier, days: Vec<String>) -> Self {
        Self {
            scenario,
            tier,
            days,
            end_uses: Vec::new(),
            index: HashMap::new(),
            columns: Vec::new(),
        }
    }

    /// Registers `end_use` and returns its column; idempotent
    pub fn add_column(&mut self, end_use: &str) -> usize {
        if let Some(&idx) = self.index.get(end_use) {
            return idx;
        }
        let idx = self.end_uses.len();
        self.end_uses.push(end_use.to_string());
        self.index.insert(end_use.to_string(), idx);
        self.columns.push(vec![None; self.days.len()]);
        idx
    }

    pub fn record(&mut self, column: usize, day: usize, savings: f64) {
        if let Some(cell) = self.columns.get_mut(column).and_then(|c| c.get_mut(day)) {
            *cell = Some(savings);
        }
    }

    pub fn build(self) -> DailySavingsTable {
        DailySavingsTable {
            scenario: self.scenario,
            tier: self.tier,
            days: self.days,
            end_uses: self.end_uses,
            columns: self.columns,
        }
    }
}
