//! Error taxonomy for loading and querying the dataset.
//!
//! Reference-table misses are deliberately absent: an unknown department or
//! region code resolves to [`crate::reference::UNKNOWN`] and is only counted.

use std::path::PathBuf;

use crate::query::Column;

/// Failure to turn a file into a dataset. Fatal for that load attempt only.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input file does not exist.
    #[error("dataset not found at {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The header row could not be decoded.
    #[error("malformed header in {}: {source}", path.display())]
    Csv {
        /// Path being read.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

/// One row rejected during normalization.
///
/// These are collected into a [`ParseSummary`] rather than propagated.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[error("row {row}: invalid {column} value {value:?}")]
pub struct ParseError {
    /// 0-based index of the data row (header excluded).
    pub row: usize,
    /// Canonical column name, or `record` for CSV-level failures.
    pub column: String,
    /// The offending raw value.
    pub value: String,
}

/// Aggregate of per-row parse failures: a count plus the first few errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ParseSummary {
    pub count: usize,
    pub samples: Vec<ParseError>,
}

impl ParseSummary {
    /// Records a failure, keeping at most `sample_size` examples.
    pub fn record(&mut self, error: ParseError, sample_size: usize) {
        log::debug!("dropping {error}");
        self.count += 1;
        if self.samples.len() < sample_size {
            self.samples.push(error);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Invalid query parameters, rejected before any work is done.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Group-aggregate called without any grouping column.
    #[error("at least one group-by column is required")]
    EmptyGroupBy,

    /// More grouping columns than the engine supports.
    #[error("at most two group-by columns are supported, got {count}")]
    TooManyGroupColumns {
        /// Number of columns requested.
        count: usize,
    },

    /// The same column was used twice where distinct columns are required.
    #[error("column `{0}` cannot be used twice")]
    DuplicateColumn(Column),

    /// A year range whose lower bound exceeds its upper bound.
    #[error("invalid year range {min}..={max}")]
    InvalidYearRange {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}
