//! Load, normalize and query French recorded-delinquency statistics.
//!
//! A delimited source file is read into a [`RawTable`](normalize::RawTable),
//! normalized into canonical records enriched with department and region
//! names, and cached as an immutable [`Dataset`]. The [`query`] module answers
//! filter/group/rank questions over it and [`reports`] builds the named views
//! on top of those queries.

pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod query;
pub mod reference;
pub mod reports;
pub mod types;
pub mod util;

pub use config::Config;
pub use dataset::{Dataset, DatasetStore, LoadedDataset};
pub use error::{LoadError, ParseError, QueryError};
pub use loader::{load_dataset, load_dataset_with, LoadOptions};
pub use normalize::{LoadReport, Normalizer, RegionPath};
pub use reference::ReferenceTables;
pub use types::{CanonicalRecord, EntityRole};
