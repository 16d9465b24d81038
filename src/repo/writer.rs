use std::path::{Path, PathBuf};
use tracing::info;

use super::RepoError;
use crate::domain::Sector;
use crate::savings::{CellFailure, DailySavingsTable};

/// Writes savings tables as `{out_dir}/{sector}/{scenario}_daily_savings_{tier}.csv`
pub struct TableWriter {
    out_dir: PathBuf,
}

impl TableWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn sector_dir(&self, sector: Sector) -> Result<PathBuf, RepoError> {
        let dir = self.out_dir.join(sector.to_string());
        std::fs::create_dir_all(&dir).map_err(|source| RepoError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    pub fn write_table(&self, sector: Sector, table: &DailySavingsTable) -> Result<PathBuf, RepoError> {
        let path = self
            .sector_dir(sector)?
            .join(format!("{}_daily_savings_{}.csv", table.scenario, table.tier));
        let mut wtr = writer(&path)?;
        let csv_error = |source| RepoError::Csv {
            path: path.clone(),
            source,
        };

        let header = std::iter::once("day").chain(table.end_uses.iter().map(String::as_str));
        wtr.write_record(header).map_err(csv_error)?;

        for (row, day) in table.days.iter().enumerate() {
            let cells = table
                .end_uses
                .iter()
                .enumerate()
                .map(|(col, _)| table.cell(row, col).map(|v| v.to_string()).unwrap_or_default());
            let record: Vec<String> = std::iter::once(day.clone()).chain(cells).collect();
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.flush().map_err(|source| RepoError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), rows = table.days.len(), columns = table.end_uses.len(), "savings table written");
        Ok(path)
    }

    /// Writes `failures.csv`; nothing is written when there are no failures
    pub fn write_failures(
        &self,
        sector: Sector,
        failures: &[CellFailure],
    ) -> Result<Option<PathBuf>, RepoError> {
        if failures.is_empty() {
            return Ok(None);
        }
        let path = self.sector_dir(sector)?.join("failures.csv");
        let mut wtr = writer(&path)?;
        for failure in failures {
            wtr.serialize(failure).map_err(|source| RepoError::Csv {
                path: path.clone(),
                source,
            })?;
        }
        wtr.flush().map_err(|source| RepoError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(path))
    }
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, RepoError> {
    csv::Writer::from_path(path).map_err(|source| RepoError::Csv {
        path: path.to_path_buf(),
        source,
    })
}
