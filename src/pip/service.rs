//! Hierarchical province → city → district resolution.

use std::sync::Arc;
use tracing::debug;

use super::{CacheStats, Dataset, DatasetCache, DatasetSource, GeoJsonSource};
use crate::config::Config;
use crate::error::{LoadError, ResolveError};
use crate::models::{AdminLevel, DatasetKey, GeoPoint, LocationResult, Region};

/// Province-level units that are cities themselves. Their child dataset lists
/// districts directly, with no city tier in between.
pub const MUNICIPALITIES: [&str; 4] = ["北京市", "上海市", "天津市", "重庆市"];

pub fn is_municipality(name: &str) -> bool {
    MUNICIPALITIES.contains(&name)
}

/// Point-to-location resolver.
///
/// The root dataset is loaded once in [`Resolver::new`] and kept for the
/// lifetime of the resolver. Finer datasets are fetched on demand.
pub struct Resolver {
    root: Arc<Dataset>,
    cache: DatasetCache,
    cache_enabled: bool,
}

impl Resolver {
    /// Create a resolver, eagerly loading the root dataset.
    ///
    /// Fails if the root dataset is missing or malformed.
    pub fn new(source: Arc<dyn DatasetSource>, cache_enabled: bool) -> Result<Self, LoadError> {
        let root_key = DatasetKey::root();
        let root = source.load(&root_key)?.ok_or_else(|| LoadError::MissingRoot {
            path: root_key.to_string().into(),
        })?;

        Ok(Self {
            root: Arc::new(root),
            cache: DatasetCache::new(source),
            cache_enabled,
        })
    }

    /// Create a resolver reading GeoJSON files as described by the config
    pub fn from_config(config: &Config) -> Result<Self, LoadError> {
        let source = GeoJsonSource::new(&config.data_dir, config.layout.clone());
        Self::new(Arc::new(source), config.cache)
    }

    /// Resolve a coordinate to province, city and district.
    ///
    /// A point outside every province is not an error: the result has every
    /// field empty.
    pub fn resolve(&self, lon: f64, lat: f64) -> Result<LocationResult, ResolveError> {
        let point = GeoPoint::new(lon, lat)?;
        let mut result = LocationResult::default();

        let Some(province) = self.root.find(&point) else {
            debug!("({}, {}) is outside every province", lon, lat);
            return Ok(result);
        };
        debug!("({}, {}) province: {} {}", lon, lat, province.name, province.code);
        result.set_province(province);

        let Some(cities) = self.child_dataset(AdminLevel::Province, &province.code)? else {
            return Ok(result);
        };
        let Some(city) = cities.find(&point) else {
            return Ok(result);
        };
        debug!("({}, {}) city tier: {} {}", lon, lat, city.name, city.code);

        if is_municipality(&province.name) {
            result.set_city(province);
            result.set_district(city);
            return Ok(result);
        }
        result.set_city(city);

        if let Some(districts) = self.child_dataset(AdminLevel::City, &city.code)? {
            if let Some(district) = districts.find(&point) {
                debug!("({}, {}) district: {} {}", lon, lat, district.name, district.code);
                result.set_district(district);
            }
        }

        Ok(result)
    }

    fn child_dataset(
        &self,
        level: AdminLevel,
        code: &str,
    ) -> Result<Option<Arc<Dataset>>, LoadError> {
        self.cache
            .get(&DatasetKey::new(level, code), self.cache_enabled)
    }

    /// Regions of the root dataset, in file order
    pub fn provinces(&self) -> &[Region] {
        self.root.regions()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
