use std::path::PathBuf;
use thiserror::Error;

/// A category code that has no label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("unknown season code {0} (expected 1-4)")]
    Season(i64),
    #[error("unknown weather code {0} (expected 1-4)")]
    Weather(i64),
}

/// Everything that can go wrong while reading the two source tables.
///
/// All variants are fatal at startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    DataLoad {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed row in {} at line {line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        message: String,
    },
    #[error("{} is missing required column `{column}`", .path.display())]
    Schema { path: PathBuf, column: &'static str },
    #[error("{} line {line}: {source}", .path.display())]
    Mapping {
        path: PathBuf,
        line: u64,
        #[source]
        source: MappingError,
    },
}

/// Invalid year/season choices coming from the command line or the menu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown season `{0}` (expected Spring, Summer, Fall or Winter)")]
    UnknownSeason(String),
    #[error("year {year} is not in the data (available: {available})")]
    UnknownYear { year: i32, available: String },
}
