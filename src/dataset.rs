//! The canonical in-memory table and its process-wide cache.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LoadError;
use crate::loader::{load_dataset_with, LoadOptions};
use crate::normalize::{to_raw_table, LoadReport, RawTable};
use crate::types::{CanonicalRecord, EntityRole};

/// Distinct values used to enumerate filter options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub crime_types: Vec<String>,
    pub entity_roles: Vec<EntityRole>,
    pub year_range: Option<(i32, i32)>,
    pub region_names: Vec<String>,
    pub department_count: usize,
}

impl Facets {
    fn of(records: &[CanonicalRecord]) -> Self {
        let mut crime_types = BTreeSet::new();
        let mut entity_roles = BTreeSet::new();
        let mut region_names = BTreeSet::new();
        let mut departments = BTreeSet::new();
        let mut year_range: Option<(i32, i32)> = None;
        for r in records {
            crime_types.insert(r.crime_type.as_str());
            entity_roles.insert(r.entity_role);
            region_names.insert(r.region_name.as_str());
            departments.insert(r.department_code.as_str());
            year_range = Some(match year_range {
                None => (r.year, r.year),
                Some((lo, hi)) => (lo.min(r.year), hi.max(r.year)),
            });
        }
        Self {
            crime_types: crime_types.into_iter().map(str::to_string).collect(),
            entity_roles: entity_roles.into_iter().collect(),
            year_range,
            region_names: region_names.into_iter().map(str::to_string).collect(),
            department_count: departments.len(),
        }
    }
}

/// An immutable, ordered collection of canonical records.
///
/// Cloning is cheap: records are shared behind an `Arc`. Every query builds
/// a new `Dataset` rather than touching this one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Arc<Vec<CanonicalRecord>>,
    facets: Facets,
}

impl Dataset {
    #[must_use]
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        let facets = Facets::of(&records);
        Self {
            records: Arc::new(records),
            facets,
        }
    }

    pub(crate) fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn facets(&self) -> &Facets {
        &self.facets
    }

    #[must_use]
    pub fn crime_types(&self) -> &[String] {
        &self.facets.crime_types
    }

    #[must_use]
    pub fn entity_roles(&self) -> &[EntityRole] {
        &self.facets.entity_roles
    }

    /// Inclusive `(min, max)` year, or `None` when empty.
    #[must_use]
    pub const fn year_range(&self) -> Option<(i32, i32)> {
        self.facets.year_range
    }

    #[must_use]
    pub fn region_names(&self) -> &[String] {
        &self.facets.region_names
    }

    #[must_use]
    pub const fn department_count(&self) -> usize {
        self.facets.department_count
    }

    /// Whether both datasets share the same record storage.
    #[must_use]
    pub fn shares_records_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// The canonical-shape table this dataset normalizes from.
    #[must_use]
    pub fn to_raw_table(&self) -> RawTable {
        to_raw_table(&self.records)
    }
}

/// A dataset together with how and when it was produced.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub report: LoadReport,
    pub source: PathBuf,
    pub loaded_at: DateTime<Utc>,
}

/// Lazily loaded, process-wide dataset cache.
///
/// The first [`get`](Self::get) loads the file; later calls return the same
/// `Arc`. [`reload`](Self::reload) builds a complete replacement before
/// publishing it, so readers never see a partially built table.
#[derive(Debug)]
pub struct DatasetStore {
    path: PathBuf,
    options: LoadOptions,
    current: RwLock<Option<Arc<LoadedDataset>>>,
}

impl DatasetStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        Self {
            path: path.into(),
            options,
            current: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached dataset, loading it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if nothing is cached yet and the load fails.
    /// Nothing is cached in that case.
    pub fn get(&self) -> Result<Arc<LoadedDataset>, LoadError> {
        if let Some(loaded) = self.cached() {
            return Ok(loaded);
        }
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(loaded) = slot.as_ref() {
            return Ok(Arc::clone(loaded));
        }
        let loaded = Arc::new(load_dataset_with(&self.path, &self.options)?);
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Re-read the source file and swap it in.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be loaded; the previously
    /// cached dataset, if any, stays published.
    pub fn reload(&self) -> Result<Arc<LoadedDataset>, LoadError> {
        let loaded = match load_dataset_with(&self.path, &self.options) {
            Ok(loaded) => Arc::new(loaded),
            Err(e) => {
                log::warn!("Reload of {} failed, keeping cached dataset: {e}", self.path.display());
                return Err(e);
            }
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&loaded));
        log::info!("Reloaded dataset ({} rows)", loaded.dataset.len());
        Ok(loaded)
    }

    #[must_use]
    pub fn cached(&self) -> Option<Arc<LoadedDataset>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
