//! Zone polygons.

use common::GeoPoint;
use geo::{Contains, LineString, Polygon};
use serde::{Deserialize, Serialize};

use super::ZoneError;

/// A zone polygon as GeoJSON-style rings of `[lng, lat]` positions.
///
/// The first ring is the outer boundary; any further rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneBoundary {
    rings: Vec<Vec<[f64; 2]>>,
}

impl ZoneBoundary {
    pub fn new(rings: Vec<Vec<[f64; 2]>>) -> Result<Self, ZoneError> {
        if rings.is_empty() {
            return Err(ZoneError::InvalidBoundary {
                reason: "polygon has no rings".to_string(),
            });
        }
        for ring in &rings {
            if ring.len() < 3 {
                return Err(ZoneError::InvalidBoundary {
                    reason: format!("ring has {} positions, need at least 3", ring.len()),
                });
            }
            if let Some([lng, lat]) = ring.iter().find(|[lng, lat]| {
                !lng.is_finite()
                    || !lat.is_finite()
                    || !(-180.0..=180.0).contains(lng)
                    || !(-90.0..=90.0).contains(lat)
            }) {
                return Err(ZoneError::InvalidBoundary {
                    reason: format!("position ({lng}, {lat}) is out of range"),
                });
            }
        }
        Ok(Self { rings })
    }

    /// Builds a boundary from a single outer ring.
    pub fn from_outer(ring: Vec<[f64; 2]>) -> Result<Self, ZoneError> {
        Self::new(vec![ring])
    }

    pub fn rings(&self) -> &[Vec<[f64; 2]>] {
        &self.rings
    }

    /// Average of the outer ring's positions.
    pub fn center(&self) -> Option<GeoPoint> {
        let outer = self.rings.first().filter(|ring| !ring.is_empty())?;
        let n = outer.len() as f64;
        let (lng, lat) = outer
            .iter()
            .fold((0.0, 0.0), |(lng, lat), [x, y]| (lng + x, lat + y));
        Some(GeoPoint::new(lng / n, lat / n))
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        let mut rings = self.rings.iter().map(|ring| LineString::from(ring.clone()));
        let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
        Polygon::new(exterior, rings.collect())
    }

    /// Returns true if `point` lies strictly inside the polygon.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.to_polygon().contains(&point.to_point())
    }
}
