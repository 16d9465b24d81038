//! # Daily Savings
//!
//! Drives the load curve optimizers over every (end-use, day, tier) of a
//! sector and collects the emissions saved into one table per tier.
//!
//! - **Cell**: solver dispatch for one day and the savings formula
//! - **Table**: column-major savings table and its builder
//! - **Aggregator**: bounded fan-out with per-solve timeout and failure reporting

pub mod aggregator;
pub mod cell;
pub mod table;

pub use aggregator::{AggregationReport, DailySavingsAggregator};
pub use cell::{emissions_savings, CellEvaluator, CellFailure, CellKey};
pub use table::{DailySavingsTable, SavingsTableBuilder};
