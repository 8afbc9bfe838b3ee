//! Dataset loading from GeoJSON files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use super::geometry;
use super::Dataset;
use crate::config::DatasetLayout;
use crate::error::LoadError;
use crate::models::{AdminLevel, DatasetKey, Region};

/// Backing storage for boundary datasets.
///
/// `Ok(None)` means no dataset exists for the key, which is normal for leaf
/// units. A dataset that exists but cannot be read is always an error.
pub trait DatasetSource: Send + Sync {
    fn load(&self, key: &DatasetKey) -> Result<Option<Dataset>, LoadError>;
}

/// Reads `FeatureCollection` files laid out as
/// `<data_dir>/<root_file>`, `<data_dir>/<province_dir>/<code>.json` and
/// `<data_dir>/<city_dir>/<code>.json`.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    data_dir: PathBuf,
    layout: DatasetLayout,
}

impl GeoJsonSource {
    pub fn new(data_dir: impl Into<PathBuf>, layout: DatasetLayout) -> Self {
        Self {
            data_dir: data_dir.into(),
            layout,
        }
    }

    /// Expected file location for a dataset.
    ///
    /// Returns `None` for codes that cannot name a file (empty, or containing
    /// path components).
    pub fn path_for(&self, key: &DatasetKey) -> Option<PathBuf> {
        let dir = match key.level {
            AdminLevel::Country => return Some(self.data_dir.join(&self.layout.root_file)),
            AdminLevel::Province => &self.layout.province_dir,
            AdminLevel::City => &self.layout.city_dir,
        };

        if !is_plain_code(&key.code) {
            return None;
        }

        Some(self.data_dir.join(dir).join(format!("{}.json", key.code)))
    }
}

impl DatasetSource for GeoJsonSource {
    fn load(&self, key: &DatasetKey) -> Result<Option<Dataset>, LoadError> {
        let Some(path) = self.path_for(key) else {
            warn!("Refusing to map code {:?} to a dataset path", key.code);
            return Ok(None);
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if key.is_root() {
                    return Err(LoadError::MissingRoot { path });
                }
                return Ok(None);
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        let regions = parse_regions(&path, &text)?;
        info!("Loaded {} ({} regions) from {}", key, regions.len(), path.display());

        Ok(Some(Dataset::build(regions)))
    }
}

fn is_plain_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse a `FeatureCollection` into ordered, repaired regions
pub fn parse_regions(path: &Path, text: &str) -> Result<Vec<Region>, LoadError> {
    let geojson: GeoJson = text.parse().map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LoadError::format(path, "expected a FeatureCollection"));
    };

    let mut regions = Vec::with_capacity(collection.features.len());

    for (position, feature) in collection.features.iter().enumerate() {
        let name = feature_name(feature)
            .ok_or_else(|| LoadError::format(path, format!("feature {} has no name", position)))?;
        let code = feature_code(feature).ok_or_else(|| {
            LoadError::format(path, format!("feature {} ({}) has no adcode", position, name))
        })?;

        // A feature without a shape cannot contain anything
        let Some(geom) = feature.geometry.as_ref() else {
            warn!("Skipping {} ({}) in {}: no geometry", name, code, path.display());
            continue;
        };

        let raw = geometry::boundary_from_geojson(&geom.value).map_err(|reason| {
            LoadError::format(path, format!("feature {} ({}): {}", position, name, reason))
        })?;

        regions.push(Region {
            name,
            code,
            boundary: geometry::repair(&raw),
        });
    }

    Ok(regions)
}

fn feature_name(feature: &Feature) -> Option<String> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get("name"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Read `adcode` as text, whether the file stores it as a string or a number
fn feature_code(feature: &Feature) -> Option<String> {
    let value = feature.properties.as_ref()?.get("adcode")?;
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some((f as i64).to_string())
                } else {
                    Some(n.to_string())
                }
            }
        }
        _ => None,
    }
}
