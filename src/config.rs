use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Serialized, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::domain::TierWindows;
use crate::optimizer::ShiftPenalty;
use crate::repo::DatasetColumns;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub data: DataConfig,
    #[validate(nested)]
    pub tiers: TierWindows,
    #[validate(nested)]
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DataConfig {
    /// Holds `{sector}_assumptions.json` and `{sector}_data.csv`
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    #[validate(nested)]
    pub columns: DatasetColumns,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: "data".into(), out_dir: "out".into(), columns: DatasetColumns::default() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SolverConfig {
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
    /// 0 means one worker per CPU
    pub max_concurrency: usize,
    #[validate(nested)]
    pub penalty: ShiftPenalty,
}

impl SolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30, max_concurrency: 0, penalty: ShiftPenalty::default() }
    }
}

impl Config {
    /// Defaults, then the TOML file (if present), then `EFLEX__`-prefixed env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("EFLEX__").split("__"));
        Self::from_figment(figment).with_context(|| format!("loading config from {}", path.display()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}
