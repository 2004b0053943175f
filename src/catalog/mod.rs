//! Catalog import: pulls the android and ios top-lists, normalizes them into
//! game candidates and reconciles them against the `games` table.

pub mod entry;
pub mod reconcile;
pub mod source;

pub use entry::{normalize, CatalogBody, Platform, RawCatalogEntry};
pub use reconcile::{populate, PopulateError, PopulateSummary};
pub use source::{CatalogClient, CatalogSources, FetchError};
