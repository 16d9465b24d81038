//! Per-sector interval dataset
//!
//! A CSV with one row per interval: a date column that groups rows into days,
//! an emissions intensity column (MOER) and one load column per end-use.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::debug;
use validator::Validate;

use super::{AssumptionTable, RepoError};
use crate::domain::IntervalSeries;

/// Names of the non-load columns of a sector dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DatasetColumns {
    #[validate(length(min = 1))]
    pub date: String,
    #[validate(length(min = 1))]
    pub emissions: String,
    /// Extra columns that are neither emissions nor load
    #[serde(default)]
    pub ignored: Vec<String>,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            emissions: "MOER".to_string(),
            ignored: Vec::new(),
        }
    }
}

/// All series of one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub date: String,
    pub emissions: IntervalSeries,
    /// Indexed like [`SectorDataset::end_uses`]
    pub loads: Vec<IntervalSeries>,
}

#[derive(Debug, Clone)]
pub struct SectorDataset {
    end_uses: Vec<String>,
    end_use_index: HashMap<String, usize>,
    days: Vec<DayRecord>,
    intervals_per_day: usize,
}

impl SectorDataset {
    pub fn load(path: &Path, columns: &DatasetColumns) -> Result<Self, RepoError> {
        let file = std::fs::File::open(path).map_err(|source| RepoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, columns, path)
    }

    /// Reads rows in file order; days are ordered by first appearance
    pub fn from_reader<R: io::Read>(
        reader: R,
        columns: &DatasetColumns,
        source: &Path,
    ) -> Result<Self, RepoError> {
        let csv_error = |e: csv::Error| RepoError::Csv {
            path: source.to_path_buf(),
            source: e,
        };
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers().map_err(csv_error)?.clone();

        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| RepoError::MissingColumn {
                    column: column.to_string(),
                    path: source.to_path_buf(),
                })
        };
        let date_col = position(&columns.date)?;
        let emissions_col = position(&columns.emissions)?;

        // Blank headers are the row index written by dataframe exports
        let load_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != date_col
                    && *i != emissions_col
                    && !h.is_empty()
                    && !columns.ignored.iter().any(|ignored| ignored == h)
            })
            .map(|(i, h)| (i, h.to_string()))
            .collect();
        if let Some(end_use) = load_cols.iter().map(|(_, name)| name).duplicates().next() {
            return Err(RepoError::DuplicateEndUse {
                end_use: end_use.clone(),
            });
        }

        let mut buffers: Vec<DayBuffer> = Vec::new();
        let mut day_index: HashMap<String, usize> = HashMap::new();

        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_error)?;
            let field = |col: usize, name: &str| -> Result<f64, RepoError> {
                let raw = record.get(col).unwrap_or_default();
                raw.parse::<f64>().map_err(|_| RepoError::InvalidValue {
                    column: name.to_string(),
                    row: row + 1,
                    value: raw.to_string(),
                })
            };

            let date = record.get(date_col).unwrap_or_default().to_string();
            let idx = *day_index.entry(date.clone()).or_insert_with(|| {
                buffers.push(DayBuffer {
                    date,
                    emissions: Vec::new(),
                    loads: vec![Vec::new(); load_cols.len()],
                });
                buffers.len() - 1
            });

            let emissions = field(emissions_col, &columns.emissions)?;
            let loads = load_cols
                .iter()
                .map(|(col, name)| field(*col, name))
                .collect::<Result<Vec<_>, _>>()?;

            let day = &mut buffers[idx];
            day.emissions.push(emissions);
            for (series, value) in day.loads.iter_mut().zip(loads) {
                series.push(value);
            }
        }

        let days: Vec<DayRecord> = buffers.into_iter().map(DayRecord::from).collect();

        let intervals_per_day = days
            .first()
            .map(|d| d.emissions.len())
            .ok_or_else(|| RepoError::Empty {
                path: source.to_path_buf(),
            })?;
        if let Some(day) = days.iter().find(|d| d.emissions.len() != intervals_per_day) {
            return Err(RepoError::InconsistentDayLength {
                date: day.date.clone(),
                expected: intervals_per_day,
                found: day.emissions.len(),
            });
        }

        debug!(
            path = %source.display(),
            days = days.len(),
            end_uses = load_cols.len(),
            intervals_per_day,
            "dataset loaded"
        );

        let end_uses: Vec<String> = load_cols.into_iter().map(|(_, name)| name).collect();
        let end_use_index = end_uses
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(Self {
            end_uses,
            end_use_index,
            days,
            intervals_per_day,
        })
    }

    pub fn end_uses(&self) -> &[String] {
        &self.end_uses
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }

    pub fn intervals_per_day(&self) -> usize {
        self.intervals_per_day
    }

    /// Baseline load of `end_use` on the `day`-th day
    pub fn load_series(&self, day: usize, end_use: &str) -> Option<&IntervalSeries> {
        let column = *self.end_use_index.get(end_use)?;
        self.days.get(day).map(|d| &d.loads[column])
    }

    /// Every dataset end-use must have an assumption and vice versa
    pub fn check_mappings(&self, assumptions: &AssumptionTable) -> Result<(), RepoError> {
        if let Some(end_use) = self.end_uses.iter().find(|e| assumptions.get(e).is_none()) {
            return Err(RepoError::MissingCategoryMapping {
                end_use: end_use.clone(),
            });
        }
        if let Some(a) = assumptions
            .iter()
            .find(|a| !self.end_use_index.contains_key(&a.end_use))
        {
            return Err(RepoError::MissingEndUseColumn {
                end_use: a.end_use.clone(),
            });
        }
        Ok(())
    }
}

struct DayBuffer {
    date: String,
    emissions: Vec<f64>,
    loads: Vec<Vec<f64>>,
}

impl From<DayBuffer> for DayRecord {
    fn from(buffer: DayBuffer) -> Self {
        Self {
            date: buffer.date,
            emissions: IntervalSeries::new(buffer.emissions),
            loads: buffer.loads.into_iter().map(IntervalSeries::new).collect(),
        }
    }
}
