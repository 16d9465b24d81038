use std::path::PathBuf;

use crate::config::DataConfig;
use crate::domain::Sector;

pub mod assumptions;
pub mod dataset;
pub mod error;
pub mod writer;

pub use assumptions::*;
pub use dataset::*;
pub use error::*;
pub use writer::*;

/// Input files of every sector under the configured data directory
pub struct Repositories {
    data_dir: PathBuf,
    columns: DatasetColumns,
}

impl Repositories {
    pub fn new(cfg: &DataConfig) -> Self {
        Self {
            data_dir: cfg.data_dir.clone(),
            columns: cfg.columns.clone(),
        }
    }

    pub fn assumptions_path(&self, sector: Sector) -> PathBuf {
        self.data_dir.join(format!("{sector}_assumptions.json"))
    }

    pub fn dataset_path(&self, sector: Sector) -> PathBuf {
        self.data_dir.join(format!("{sector}_data.csv"))
    }

    pub fn assumptions(&self, sector: Sector) -> Result<AssumptionTable, RepoError> {
        AssumptionTable::load(&self.assumptions_path(sector))
    }

    pub fn dataset(&self, sector: Sector) -> Result<SectorDataset, RepoError> {
        SectorDataset::load(&self.dataset_path(sector), &self.columns)
    }
}
