//! Point-in-Polygon (PIP) administrative lookup.
//!
//! Loads nested boundary datasets on demand and walks them
//! province → city → district for a query point.

mod cache;
pub mod geometry;
mod index;
mod loader;
mod service;

pub use cache::{CacheStats, DatasetCache};
pub use index::Dataset;
pub use loader::{parse_regions, DatasetSource, GeoJsonSource};
pub use service::{is_municipality, Resolver, MUNICIPALITIES};
