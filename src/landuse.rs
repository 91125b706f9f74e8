//! Land-use classification.
//!
//! The pipeline only ever asks one question of land-use data: which class
//! lies within `radius` of a point. [`LandUseLookup`] is that question.
//! [`LandUseLayer`] answers it for an in-memory polygon collection indexed
//! by an R-tree.

use geo::{BoundingRect, EuclideanDistance, LineString, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{CrowdError, Result};
use crate::Point;

/// Opaque land-use category label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandUseClass(pub String);

impl LandUseClass {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LandUseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LandUseClass {
    fn from(s: &str) -> Self {
        LandUseClass(s.to_string())
    }
}

impl From<String> for LandUseClass {
    fn from(s: String) -> Self {
        LandUseClass(s)
    }
}

/// `Sync` when the `parallel` feature is on, empty otherwise.
#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync + ?Sized> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T: ?Sized> MaybeSync for T {}

/// Spatial land-use classification capability.
pub trait LandUseLookup: MaybeSync {
    /// Class of the polygon closest to `point` among those within `radius`
    /// of it, or `None` if nothing is that close. `radius = 0` asks for the
    /// polygon containing the point.
    fn classify(&self, point: &Point, radius: f64) -> Option<LandUseClass>;
}

impl<F> LandUseLookup for F
where
    F: Fn(&Point, f64) -> Option<LandUseClass> + MaybeSync,
{
    fn classify(&self, point: &Point, radius: f64) -> Option<LandUseClass> {
        self(point, radius)
    }
}

/// A classified polygon stored in the R-tree.
#[derive(Debug, Clone)]
struct LandUseEntry {
    idx: usize,
    class: LandUseClass,
    polygon: Polygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for LandUseEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Serialized form of one land-use polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandUseRecord {
    pub class: String,
    /// Outer ring as `[x, y]` pairs
    pub exterior: Vec<[f64; 2]>,
    /// Holes as `[x, y]` rings
    #[serde(default)]
    pub interiors: Vec<Vec<[f64; 2]>>,
}

impl LandUseRecord {
    fn into_polygon(self) -> Result<(LandUseClass, Polygon<f64>)> {
        if self.exterior.len() < 3 {
            return Err(CrowdError::InvalidLandUse(format!(
                "polygon of class '{}' has {} exterior vertices, at least 3 required",
                self.class,
                self.exterior.len()
            )));
        }
        let ring = |coords: Vec<[f64; 2]>| {
            LineString::from(coords.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>())
        };
        let interiors = self.interiors.into_iter().map(ring).collect();
        let polygon = Polygon::new(ring(self.exterior), interiors);
        Ok((LandUseClass(self.class), polygon))
    }
}

/// Polygon land-use layer with an R-tree over polygon envelopes.
#[derive(Debug)]
pub struct LandUseLayer {
    tree: RTree<LandUseEntry>,
}

impl Default for LandUseLayer {
    fn default() -> Self {
        Self {
            tree: RTree::new(),
        }
    }
}

impl LandUseLayer {
    /// Build a layer from classified polygons. Empty polygons are skipped.
    pub fn new(polygons: Vec<(LandUseClass, Polygon<f64>)>) -> Self {
        let entries: Vec<LandUseEntry> = polygons
            .into_iter()
            .enumerate()
            .filter_map(|(idx, (class, polygon))| {
                let rect = polygon.bounding_rect()?;
                Some(LandUseEntry {
                    idx,
                    class,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    polygon,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Build a layer from serialized records.
    pub fn from_records(records: Vec<LandUseRecord>) -> Result<Self> {
        let polygons = records
            .into_iter()
            .map(LandUseRecord::into_polygon)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(polygons))
    }

    /// Read a JSON array of [`LandUseRecord`].
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let records: Vec<LandUseRecord> = serde_json::from_reader(reader)?;
        Self::from_records(records)
    }

    /// Read a JSON array of [`LandUseRecord`] from a file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<LandUseRecord> = serde_json::from_str(json)?;
        Self::from_records(records)
    }

    /// Number of indexed polygons.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl LandUseLookup for LandUseLayer {
    fn classify(&self, point: &Point, radius: f64) -> Option<LandUseClass> {
        let radius = radius.max(0.0);
        let search = AABB::from_corners(
            [point.x - radius, point.y - radius],
            [point.x + radius, point.y + radius],
        );
        let query = geo::Point::from(*point);

        self.tree
            .locate_in_envelope_intersecting(&search)
            .filter_map(|entry| {
                let dist = query.euclidean_distance(&entry.polygon);
                (dist <= radius).then_some((dist, entry.idx, &entry.class))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, _, class)| class.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_closest_polygon_wins() {
        let layer = LandUseLayer::new(vec![
            (LandUseClass::from("water"), square(0.0, 0.0, 10.0)),
            (LandUseClass::from("forest"), square(14.0, 0.0, 10.0)),
        ]);
        let p = Point::new(11.5, 5.0);
        assert_eq!(layer.classify(&p, 5.0), Some(LandUseClass::from("water")));
        let q = Point::new(13.0, 5.0);
        assert_eq!(layer.classify(&q, 5.0), Some(LandUseClass::from("forest")));
    }

    #[test]
    fn test_tie_breaks_on_insertion_order() {
        let layer = LandUseLayer::new(vec![
            (LandUseClass::from("a"), square(0.0, 0.0, 10.0)),
            (LandUseClass::from("b"), square(20.0, 0.0, 10.0)),
        ]);
        assert_eq!(layer.classify(&Point::new(15.0, 5.0), 5.0), Some(LandUseClass::from("a")));
    }
}
