use geo::{BooleanOps, Contains, Coord, LineString, MultiPolygon, Polygon};
use geojson::Value;

use crate::models::GeoPoint;

/// Build a closed ring from GeoJSON positions.
///
/// Returns `None` for rings with fewer than three distinct vertices.
pub fn ring_from_positions(positions: &[Vec<f64>]) -> Option<LineString<f64>> {
    let mut ring: Vec<Coord<f64>> = positions
        .iter()
        .filter_map(|pos| match pos.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect();

    if ring.len() < 3 {
        return None;
    }

    // Close the ring if needed
    if ring.first() != ring.last() {
        ring.push(ring[0]);
    }

    if ring.len() < 4 {
        return None;
    }

    Some(LineString::new(ring))
}

/// Build a polygon from GeoJSON rings (exterior first, then holes).
///
/// A missing or degenerate exterior is an error; degenerate holes are dropped.
pub fn polygon_from_rings(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let (exterior, holes) = rings
        .split_first()
        .ok_or_else(|| "polygon has no exterior ring".to_string())?;
    let exterior = ring_from_positions(exterior).ok_or_else(|| {
        format!(
            "exterior ring has {} positions, need at least 3 distinct vertices",
            exterior.len()
        )
    })?;
    let interiors = holes
        .iter()
        .filter_map(|hole| ring_from_positions(hole))
        .collect();
    Ok(Polygon::new(exterior, interiors))
}

/// Convert a GeoJSON geometry into a multipolygon boundary.
///
/// Only `Polygon` and `MultiPolygon` describe an area; anything else is an error.
pub fn boundary_from_geojson(value: &Value) -> Result<MultiPolygon<f64>, String> {
    match value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .map(|rings| polygon_from_rings(rings))
            .collect::<Result<Vec<_>, _>>()
            .map(MultiPolygon::new),
        _ => Err("expected Polygon or MultiPolygon geometry".to_string()),
    }
}

/// Zero-width validity repair.
///
/// Each polygon is unioned with itself, which re-nodes self-intersections and
/// yields valid output. Overlapping members of a multipolygon are kept as
/// separate parts. A degenerate polygon may repair to nothing.
pub fn repair(boundary: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        boundary
            .iter()
            .flat_map(|polygon| polygon.union(polygon).0)
            .collect(),
    )
}

/// Interior containment test. Points on an edge are outside.
pub fn contains(boundary: &MultiPolygon<f64>, point: &GeoPoint) -> bool {
    boundary.contains(&point.to_geo())
}
