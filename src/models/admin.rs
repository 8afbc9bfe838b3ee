//! Administrative hierarchy types for PIP lookup.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Tier of a boundary dataset in the lookup hierarchy.
///
/// Each level names the dataset *file* being read, not the regions inside it:
/// the `Province` dataset for code `440000` lists the cities of that province,
/// and the `City` dataset for `440300` lists the districts of that city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdminLevel {
    /// Root dataset listing all provinces
    Country,
    /// Per-province dataset listing its cities
    Province,
    /// Per-city dataset listing its districts
    City,
}

impl AdminLevel {
    /// Get the field name for this level
    pub fn field_name(&self) -> &'static str {
        match self {
            AdminLevel::Country => "country",
            AdminLevel::Province => "province",
            AdminLevel::City => "city",
        }
    }
}

impl std::fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Identity of a dataset: its tier plus the parent code it subdivides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub level: AdminLevel,
    pub code: String,
}

impl DatasetKey {
    pub fn new(level: AdminLevel, code: impl Into<String>) -> Self {
        Self {
            level,
            code: code.into(),
        }
    }

    /// The single country-wide dataset. It has no parent code.
    pub fn root() -> Self {
        Self::new(AdminLevel::Country, String::new())
    }

    pub fn is_root(&self) -> bool {
        self.level == AdminLevel::Country
    }
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "{}", self.level)
        } else {
            write!(f, "{}/{}", self.level, self.code)
        }
    }
}

/// A single labeled boundary read from a dataset.
///
/// `boundary` has already been through validity repair, so containment tests
/// run against it directly.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Administrative code (adcode), always kept as text
    pub code: String,
    pub boundary: MultiPolygon<f64>,
}

impl Region {
    /// Get the bounding box of this region
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        use geo::BoundingRect;
        self.boundary
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// Resolved location for a point.
///
/// Every tier is a plain string; unresolved tiers are empty rather than absent
/// so the serialized shape never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationResult {
    pub prov_name: String,
    pub prov_code: String,
    pub city_name: String,
    pub city_code: String,
    pub district_name: String,
    pub district_code: String,
}

impl LocationResult {
    pub fn set_province(&mut self, region: &Region) {
        self.prov_name = region.name.clone();
        self.prov_code = region.code.clone();
    }

    pub fn set_city(&mut self, region: &Region) {
        self.city_name = region.name.clone();
        self.city_code = region.code.clone();
    }

    pub fn set_district(&mut self, region: &Region) {
        self.district_name = region.name.clone();
        self.district_code = region.code.clone();
    }

    /// True when not even a province was matched
    pub fn is_empty(&self) -> bool {
        self.prov_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_key_display() {
        assert_eq!(DatasetKey::root().to_string(), "country");
        assert_eq!(
            DatasetKey::new(AdminLevel::Province, "440000").to_string(),
            "province/440000"
        );
    }

    #[test]
    fn test_empty_result_serializes_all_fields() {
        let json = serde_json::to_value(LocationResult::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        for key in [
            "prov_name",
            "prov_code",
            "city_name",
            "city_code",
            "district_name",
            "district_code",
        ] {
            assert_eq!(obj[key], "");
        }
    }
}
