//! adlocate - resolve coordinates to province / city / district
//!
//! This library provides the lookup engine used by the HTTP server binary.

pub mod config;
pub mod error;
pub mod models;
pub mod pip;

pub use config::{Config, DatasetLayout};
pub use error::{LoadError, ResolveError};
pub use models::{AdminLevel, DatasetKey, GeoPoint, LocationResult, Region};
pub use pip::{DatasetSource, GeoJsonSource, Resolver};
