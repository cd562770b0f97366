//! Capital-flow scenario classification.
//!
//! [`catalog`] holds the validated scenario definitions, [`services`] the
//! matcher that ranks them against a day's signals and the analyzer that puts
//! the winner in the context of recent history.

pub mod catalog;
pub mod services;

pub use catalog::{CatalogError, ScenarioCatalog};
