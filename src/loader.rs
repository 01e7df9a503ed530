use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use chrono::Utc;
use csv::ReaderBuilder;

use crate::dataset::{Dataset, LoadedDataset};
use crate::error::LoadError;
use crate::normalize::{Normalizer, RawTable};

/// Field separator used by the published files.
pub const DEFAULT_DELIMITER: u8 = b';';

/// How a file is read and normalized.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub normalizer: Normalizer,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            normalizer: Normalizer::default(),
        }
    }
}

/// Read a delimited file into a [`RawTable`] without interpreting any cell.
///
/// Ragged rows are accepted; rows the CSV reader cannot decode (bad UTF-8)
/// are recorded as rejected rather than aborting the read.
pub fn read_raw_table(path: &Path, delimiter: u8) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut table = RawTable::new(headers);
    for result in rdr.records() {
        match result {
            Ok(record) => table.push(record),
            Err(e) if e.is_io_error() => {
                return Err(LoadError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => table.reject(e.to_string()),
        }
    }
    Ok(table)
}

/// Load and normalize `path` with default options.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<LoadedDataset, LoadError> {
    load_dataset_with(path, &LoadOptions::default())
}

pub fn load_dataset_with(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<LoadedDataset, LoadError> {
    let path = path.as_ref();
    log::info!("Loading dataset from {}", path.display());
    let table = read_raw_table(path, options.delimiter)?;
    let out = options.normalizer.normalize(table);
    log::info!(
        "Processed dataset ({} rows read, {} canonical)",
        out.report.total_rows,
        out.report.canonical_rows
    );
    Ok(LoadedDataset {
        dataset: Dataset::new(out.records),
        report: out.report,
        source: path.to_path_buf(),
        loaded_at: Utc::now(),
    })
}
