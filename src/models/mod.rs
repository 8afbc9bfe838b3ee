//! Core data models for the lookup engine.

pub mod admin;
pub mod point;

pub use admin::{AdminLevel, DatasetKey, LocationResult, Region};
pub use point::GeoPoint;
