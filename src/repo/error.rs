use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse assumption table {path}: {source}")]
    Assumptions {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("End-use '{end_use}' has no entry in the assumption table")]
    MissingCategoryMapping { end_use: String },

    #[error("End-use '{end_use}' from the assumption table has no column in the dataset")]
    MissingEndUseColumn { end_use: String },

    #[error("End-use '{end_use}' appears more than once")]
    DuplicateEndUse { end_use: String },

    #[error("Day {date} has {found} intervals, expected {expected}")]
    InconsistentDayLength {
        date: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Dataset {path} has no rows")]
    Empty { path: PathBuf },
}
