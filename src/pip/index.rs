//! Ordered region set with a spatial pre-filter.

use rstar::{RTree, RTreeObject, AABB};

use super::geometry;
use crate::models::{GeoPoint, Region};

/// R-tree entry pointing back at a region by its position in the dataset
#[derive(Clone)]
struct IndexedRegion {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    fn new(position: usize, region: &Region) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = region.bbox()?;
        Some(Self {
            position,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// An ordered list of regions loaded from one file.
///
/// Order matters: when boundaries overlap, the earliest region wins.
pub struct Dataset {
    regions: Vec<Region>,
    tree: RTree<IndexedRegion>,
}

impl Dataset {
    /// Build the dataset and its bounding-box index
    pub fn build(regions: Vec<Region>) -> Self {
        // Regions with an empty boundary have no bbox and can never match
        let indexed: Vec<IndexedRegion> = regions
            .iter()
            .enumerate()
            .filter_map(|(position, region)| IndexedRegion::new(position, region))
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            regions,
        }
    }

    /// Find the first region (in dataset order) whose boundary contains the point
    pub fn find(&self, point: &GeoPoint) -> Option<&Region> {
        let query_envelope = AABB::from_point([point.lon, point.lat]);

        // R-tree iteration order is arbitrary; restore dataset order before testing
        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|entry| entry.position)
            .collect();
        candidates.sort_unstable();

        candidates
            .into_iter()
            .map(|position| &self.regions[position])
            .find(|region| geometry::contains(&region.boundary, point))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("regions", &self.regions.len())
            .finish()
    }
}
