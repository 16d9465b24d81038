//! Daily savings aggregation
//!
//! Plans one cell per (end-use, tier, day), fans the cells out over the
//! blocking pool and merges the per-task results into one table per tier.
//! Cells share no mutable state; each task returns its own outcome and the
//! builders are only touched by the collecting loop.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, trace};

use super::{CellEvaluator, CellFailure, CellKey, DailySavingsTable, SavingsTableBuilder};
use crate::domain::{EndUseCategory, FlexibilityTier, Scenario};
use crate::optimizer::OptimizerError;
use crate::repo::{AssumptionTable, SectorDataset};

/// Result of aggregating one scenario over a sector dataset
#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub scenario: Scenario,
    /// One table per tier, in tier order
    pub tables: Vec<DailySavingsTable>,
    pub failures: Vec<CellFailure>,
    pub solved: usize,
}

impl AggregationReport {
    pub fn table(&self, tier: FlexibilityTier) -> Option<&DailySavingsTable> {
        self.tables.iter().find(|t| t.tier == tier)
    }
}

#[derive(Debug, Clone, Copy)]
struct PlannedCell {
    key: CellKey,
    /// Index of the tier's table builder
    table: usize,
    /// Index into the assumption table
    assumption: usize,
}

pub struct DailySavingsAggregator {
    evaluator: CellEvaluator,
    timeout: Duration,
    max_concurrency: usize,
}

impl DailySavingsAggregator {
    /// `max_concurrency == 0` uses one worker per CPU
    pub fn new(evaluator: CellEvaluator, timeout: Duration, max_concurrency: usize) -> Self {
        let max_concurrency = if max_concurrency == 0 {
            num_cpus::get()
        } else {
            max_concurrency
        };
        Self {
            evaluator,
            timeout,
            max_concurrency,
        }
    }

    /// Whether an end-use of `category` gets a column in the `tier` table
    pub fn includes(scenario: Scenario, category: &EndUseCategory, tier: FlexibilityTier) -> bool {
        match scenario {
            Scenario::Shift => category.shifts_at(tier),
            Scenario::Shed => true,
        }
    }

    #[instrument(skip_all, fields(%scenario))]
    pub async fn aggregate(
        &self,
        scenario: Scenario,
        assumptions: Arc<AssumptionTable>,
        dataset: Arc<SectorDataset>,
    ) -> Result<AggregationReport> {
        let started = Instant::now();
        let tiers = scenario.tiers();
        let days: Vec<String> = dataset.days().iter().map(|d| d.date.clone()).collect();

        let mut builders: Vec<SavingsTableBuilder> = tiers
            .iter()
            .map(|&tier| SavingsTableBuilder::new(scenario, tier, days.clone()))
            .collect();

        let mut plan = Vec::new();
        for (assumption_idx, assumption) in assumptions.iter().enumerate() {
            for (table, &tier) in tiers.iter().enumerate() {
                if !Self::includes(scenario, &assumption.category, tier) {
                    continue;
                }
                let column = builders[table].add_column(&assumption.end_use);
                plan.extend((0..days.len()).map(|day| PlannedCell {
                    key: CellKey {
                        scenario,
                        tier,
                        day,
                        column,
                    },
                    table,
                    assumption: assumption_idx,
                }));
            }
        }
        info!(
            cells = plan.len(),
            days = days.len(),
            end_uses = assumptions.len(),
            workers = self.max_concurrency,
            "aggregating daily savings"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for cell in plan {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("solver pool closed")?;
            let assumptions = assumptions.clone();
            let dataset = dataset.clone();
            let evaluator = self.evaluator;
            let timeout = self.timeout;

            tasks.spawn(async move {
                let _permit = permit;
                let solve = tokio::task::spawn_blocking(move || {
                    evaluate(&evaluator, &cell, &assumptions, &dataset)
                });
                let outcome = match tokio::time::timeout(timeout, solve).await {
                    Ok(Ok(result)) => result.map_err(|e| e.to_string()),
                    Ok(Err(e)) => Err(format!("solver task failed: {e}")),
                    Err(_) => Err(format!("solve exceeded {}s timeout", timeout.as_secs_f64())),
                };
                (cell, outcome)
            });
        }

        let mut solved = 0;
        let mut failed: Vec<(CellKey, CellFailure)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (cell, outcome) = joined.context("aggregation task failed")?;
            let key = cell.key;
            match outcome {
                Ok(savings) => {
                    trace!(tier = %key.tier, day = key.day, column = key.column, savings, "cell solved");
                    builders[cell.table].record(key.column, key.day, savings);
                    solved += 1;
                }
                Err(message) => {
                    let failure = CellFailure {
                        scenario,
                        tier: key.tier,
                        date: days[key.day].clone(),
                        end_use: assumptions.entries()[cell.assumption].end_use.clone(),
                        error: message,
                    };
                    error!(
                        tier = %failure.tier,
                        date = %failure.date,
                        end_use = %failure.end_use,
                        error = %failure.error,
                        "cell failed"
                    );
                    failed.push((key, failure));
                }
            }
        }

        failed.sort_by_key(|(key, _)| (key.tier, key.day, key.column));
        let failures: Vec<CellFailure> = failed.into_iter().map(|(_, f)| f).collect();
        let tables: Vec<DailySavingsTable> = builders.into_iter().map(|b| b.build()).collect();

        info!(
            solved,
            failed = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "aggregation finished"
        );

        Ok(AggregationReport {
            scenario,
            tables,
            failures,
            solved,
        })
    }
}

fn evaluate(
    evaluator: &CellEvaluator,
    cell: &PlannedCell,
    assumptions: &AssumptionTable,
    dataset: &SectorDataset,
) -> Result<f64, OptimizerError> {
    let assumption = &assumptions.entries()[cell.assumption];
    let day = &dataset.days()[cell.key.day];
    let load = dataset.load_series(cell.key.day, &assumption.end_use).ok_or_else(|| {
        OptimizerError::MalformedInput(format!("no load series for '{}'", assumption.end_use))
    })?;

    evaluator.savings(
        cell.key.scenario,
        &assumption.category,
        cell.key.tier,
        assumption.profile.proportion(cell.key.tier),
        &day.emissions,
        load,
    )
}
