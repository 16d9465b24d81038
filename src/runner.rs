//! Sector-level orchestration: load inputs, aggregate every requested
//! scenario, write the tables.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{error, info, instrument, warn};

use crate::config::Config;
use crate::domain::{Scenario, Sector};
use crate::repo::{Repositories, TableWriter};
use crate::savings::{AggregationReport, CellEvaluator, CellFailure, DailySavingsAggregator};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub sectors: Vec<Sector>,
    pub scenarios: Vec<Scenario>,
    /// Compute and log without writing any file
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sectors: Sector::iter().collect(),
            scenarios: Scenario::iter().collect(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectorReport {
    pub sector: Sector,
    pub reports: Vec<AggregationReport>,
    pub written: Vec<PathBuf>,
}

impl SectorReport {
    pub fn report(&self, scenario: Scenario) -> Option<&AggregationReport> {
        self.reports.iter().find(|r| r.scenario == scenario)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CellFailure> {
        self.reports.iter().flat_map(|r| r.failures.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub sectors: Vec<SectorReport>,
    /// Sectors stopped by a configuration or input error, with the reason
    pub aborted: Vec<(Sector, String)>,
}

impl RunSummary {
    pub fn failed_cells(&self) -> usize {
        self.sectors.iter().map(|s| s.failures().count()).sum()
    }
}

pub struct Runner {
    repos: Repositories,
    writer: TableWriter,
    aggregator: DailySavingsAggregator,
}

impl Runner {
    pub fn new(cfg: &Config) -> Self {
        let evaluator = CellEvaluator::new(cfg.tiers, cfg.solver.penalty);
        Self {
            repos: Repositories::new(&cfg.data),
            writer: TableWriter::new(cfg.data.out_dir.clone()),
            aggregator: DailySavingsAggregator::new(
                evaluator,
                cfg.solver.timeout(),
                cfg.solver.max_concurrency,
            ),
        }
    }

    /// Runs every requested sector; an aborted sector does not stop the others
    pub async fn run(&self, options: &RunOptions) -> RunSummary {
        let mut summary = RunSummary::default();
        for &sector in &options.sectors {
            match self.run_sector(sector, &options.scenarios, options.dry_run).await {
                Ok(report) => summary.sectors.push(report),
                Err(e) => {
                    let reason = format!("{e:#}");
                    error!(%sector, error = %reason, "sector aborted");
                    summary.aborted.push((sector, reason));
                }
            }
        }

        info!(
            sectors = summary.sectors.len(),
            aborted = summary.aborted.len(),
            failed_cells = summary.failed_cells(),
            "run finished"
        );
        summary
    }

    #[instrument(skip_all, fields(%sector, dry_run))]
    pub async fn run_sector(
        &self,
        sector: Sector,
        scenarios: &[Scenario],
        dry_run: bool,
    ) -> Result<SectorReport> {
        let assumptions = self
            .repos
            .assumptions(sector)
            .with_context(|| format!("loading {sector} assumptions"))?;
        let dataset = self
            .repos
            .dataset(sector)
            .with_context(|| format!("loading {sector} dataset"))?;
        dataset
            .check_mappings(&assumptions)
            .with_context(|| format!("{sector} assumption table does not match the dataset"))?;

        info!(
            days = dataset.days().len(),
            end_uses = assumptions.len(),
            intervals_per_day = dataset.intervals_per_day(),
            "sector inputs loaded"
        );

        let assumptions = Arc::new(assumptions);
        let dataset = Arc::new(dataset);
        let mut reports = Vec::with_capacity(scenarios.len());
        let mut written = Vec::new();

        for &scenario in scenarios {
            let report = self
                .aggregator
                .aggregate(scenario, assumptions.clone(), dataset.clone())
                .await
                .with_context(|| format!("aggregating {sector} {scenario} savings"))?;

            for table in &report.tables {
                info!(
                    %scenario,
                    tier = %table.tier,
                    end_uses = table.end_uses.len(),
                    total_savings = table.total(),
                    missing_cells = table.missing_cells(),
                    "daily savings"
                );
                if !dry_run {
                    written.push(self.writer.write_table(sector, table)?);
                }
            }
            reports.push(report);
        }

        let failures: Vec<CellFailure> = reports.iter().flat_map(|r| r.failures.clone()).collect();
        if !failures.is_empty() {
            warn!(count = failures.len(), "some cells could not be solved");
            if !dry_run {
                written.extend(self.writer.write_failures(sector, &failures)?);
            }
        }

        Ok(SectorReport {
            sector,
            reports,
            written,
        })
    }
}
