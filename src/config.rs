//! Runtime configuration: built-in defaults, overlaid by environment
//! variables, overlaid by command-line flags in the binary.

use std::path::PathBuf;
use std::str::FromStr;

use crate::loader::{LoadOptions, DEFAULT_DELIMITER};
use crate::normalize::{Normalizer, RegionPath, DEFAULT_ERROR_SAMPLE_SIZE};
use crate::reference::ReferenceTables;

pub const DEFAULT_DATA_PATH: &str = "data/delinquency.csv";

pub const ENV_DATA_PATH: &str = "DELINQUENCY_DATA";
pub const ENV_DELIMITER: &str = "DELINQUENCY_DELIMITER";
pub const ENV_REGION_PATH: &str = "DELINQUENCY_REGION_PATH";
pub const ENV_ERROR_SAMPLES: &str = "DELINQUENCY_ERROR_SAMPLES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub delimiter: u8,
    pub region_path: RegionPath,
    pub error_sample_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            delimiter: DEFAULT_DELIMITER,
            region_path: RegionPath::default(),
            error_sample_size: DEFAULT_ERROR_SAMPLE_SIZE,
        }
    }
}

impl Config {
    /// Defaults overlaid with the `DELINQUENCY_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply values from `lookup`. Unparseable values are logged and ignored.
    #[must_use]
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_DATA_PATH).filter(|p| !p.trim().is_empty()) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_DELIMITER) {
            match parse_delimiter(&raw) {
                Ok(d) => self.delimiter = d,
                Err(e) => log::warn!("Ignoring {ENV_DELIMITER}: {e}"),
            }
        }
        if let Some(raw) = lookup(ENV_REGION_PATH) {
            match RegionPath::from_str(raw.trim()) {
                Ok(p) => self.region_path = p,
                Err(_) => log::warn!("Ignoring {ENV_REGION_PATH}: unknown path {raw:?}"),
            }
        }
        if let Some(raw) = lookup(ENV_ERROR_SAMPLES) {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.error_sample_size = n,
                Err(e) => log::warn!("Ignoring {ENV_ERROR_SAMPLES}: {e}"),
            }
        }
        self
    }

    #[must_use]
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(ReferenceTables::builtin())
            .with_region_path(self.region_path)
            .with_error_sample_size(self.error_sample_size)
    }

    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter,
            normalizer: self.normalizer(),
        }
    }
}

/// Parse a single-byte field delimiter. Accepts one ASCII character, or the
/// names `tab`/`\t`.
pub fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let raw = raw.trim();
    match raw.as_bytes() {
        [b] if b.is_ascii() && !b.is_ascii_alphanumeric() => Ok(*b),
        _ => Err(format!("expected a single punctuation character, got {raw:?}")),
    }
}
