//! Memoized dataset access with per-key single-flight loading.
//!
//! Every key owns a `OnceCell`. The first caller for a key runs the load while
//! holding only that cell; concurrent callers for the same key block on the
//! cell and receive the same result. The `DashMap` shard lock is released
//! before any load starts, so loads for unrelated keys never wait on each
//! other and lookups of populated keys never wait on in-flight loads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::debug;

use super::{Dataset, DatasetSource};
use crate::error::LoadError;
use crate::models::DatasetKey;

/// Cached outcome for one key. `None` marks a known-absent dataset.
type Slot = Arc<OnceCell<Option<Arc<Dataset>>>>;

/// Statistics for monitoring cache effectiveness.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Calls that reached the dataset source
    pub loads: u64,
    /// Calls served from a populated entry
    pub hits: u64,
    /// Keys with a settled entry (including absent ones)
    pub entries: usize,
}

pub struct DatasetCache {
    source: Arc<dyn DatasetSource>,
    slots: DashMap<DatasetKey, Slot>,
    loads: AtomicU64,
    hits: AtomicU64,
}

impl DatasetCache {
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            slots: DashMap::new(),
            loads: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Fetch a dataset, loading it at most once per key when caching is on.
    ///
    /// With `cache_enabled == false` the map is neither read nor written and
    /// every call goes to the source. A failed load leaves the key unsettled,
    /// so the next call tries again.
    pub fn get(
        &self,
        key: &DatasetKey,
        cache_enabled: bool,
    ) -> Result<Option<Arc<Dataset>>, LoadError> {
        if !cache_enabled {
            return self.load(key);
        }

        let slot = self.slot(key);

        if let Some(entry) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(entry.clone());
        }

        let mut loaded_here = false;
        let entry = slot.get_or_try_init(|| {
            loaded_here = true;
            self.load(key)
        })?;

        if !loaded_here {
            // Another caller finished the load while we waited on the cell
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Shared in-flight load for {}", key);
        }

        Ok(entry.clone())
    }

    /// Get or create the cell for a key without holding the shard lock afterwards
    fn slot(&self, key: &DatasetKey) -> Slot {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(&slot);
        }
        Arc::clone(&self.slots.entry(key.clone()).or_default())
    }

    fn load(&self, key: &DatasetKey) -> Result<Option<Arc<Dataset>>, LoadError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        let dataset = self.source.load(key)?;
        if dataset.is_none() {
            debug!("No dataset for {}", key);
        }
        Ok(dataset.map(Arc::new))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            loads: self.loads.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: self.slots.iter().filter(|s| s.value().get().is_some()).count(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{AdminLevel, Region};
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;
    use std::sync::{Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    /// In-memory source that counts loads per key
    #[derive(Default)]
    pub(crate) struct CountingSource {
        pub datasets: HashMap<DatasetKey, Vec<Region>>,
        pub broken: Vec<DatasetKey>,
        pub delay: Option<Duration>,
        pub calls: Mutex<HashMap<DatasetKey, usize>>,
    }

    impl CountingSource {
        pub fn calls_for(&self, key: &DatasetKey) -> usize {
            self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    impl DatasetSource for CountingSource {
        fn load(&self, key: &DatasetKey) -> Result<Option<Dataset>, LoadError> {
            *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;
            if let Some(delay) = self.delay {
                thread::sleep(delay);
            }
            if self.broken.contains(key) {
                return Err(LoadError::format(key.to_string(), "broken fixture"));
            }
            Ok(self
                .datasets
                .get(key)
                .map(|regions| Dataset::build(regions.clone())))
        }
    }

    pub(crate) fn square(name: &str, code: &str, min: (f64, f64), max: (f64, f64)) -> Region {
        Region {
            name: name.to_string(),
            code: code.to_string(),
            boundary: MultiPolygon::new(vec![polygon![
                (x: min.0, y: min.1),
                (x: max.0, y: min.1),
                (x: max.0, y: max.1),
                (x: min.0, y: max.1),
                (x: min.0, y: min.1),
            ]]),
        }
    }

    fn province_key() -> DatasetKey {
        DatasetKey::new(AdminLevel::Province, "440000")
    }

    fn source_with_province() -> Arc<CountingSource> {
        let mut source = CountingSource::default();
        source.datasets.insert(
            province_key(),
            vec![square("Shenzhen", "440300", (0.0, 0.0), (1.0, 1.0))],
        );
        Arc::new(source)
    }

    #[test]
    fn test_cached_key_loads_once() {
        let source = source_with_province();
        let cache = DatasetCache::new(source.clone());

        let first = cache.get(&province_key(), true).unwrap().unwrap();
        let second = cache.get(&province_key(), true).unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls_for(&province_key()), 1);
        let stats = cache.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_absent_sentinel_cached() {
        let source = source_with_province();
        let cache = DatasetCache::new(source.clone());
        let missing = DatasetKey::new(AdminLevel::City, "440305");

        assert!(cache.get(&missing, true).unwrap().is_none());
        assert!(cache.get(&missing, true).unwrap().is_none());
        assert_eq!(source.calls_for(&missing), 1);
    }

    #[test]
    fn test_disabled_cache_always_loads() {
        let source = source_with_province();
        let cache = DatasetCache::new(source.clone());

        cache.get(&province_key(), false).unwrap();
        cache.get(&province_key(), false).unwrap();

        assert_eq!(source.calls_for(&province_key()), 2);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_failed_load_not_cached() {
        let mut source = CountingSource::default();
        source.broken.push(province_key());
        let source = Arc::new(source);
        let cache = DatasetCache::new(source.clone());

        assert!(cache.get(&province_key(), true).is_err());
        assert!(cache.get(&province_key(), true).is_err());
        assert_eq!(source.calls_for(&province_key()), 2);
    }

    #[test]
    fn test_concurrent_first_access_single_flight() {
        let mut source = CountingSource::default();
        source.datasets.insert(
            province_key(),
            vec![square("Shenzhen", "440300", (0.0, 0.0), (1.0, 1.0))],
        );
        source.delay = Some(Duration::from_millis(50));
        let source = Arc::new(source);
        let cache = Arc::new(DatasetCache::new(source.clone()));

        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get(&province_key(), true).unwrap().unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<Dataset>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(source.calls_for(&province_key()), 1);
        for dataset in &results {
            assert!(Arc::ptr_eq(dataset, &results[0]));
        }
        let stats = cache.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, (workers - 1) as u64);
    }
}
