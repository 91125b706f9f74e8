//! Grid rasterization of a track.
//!
//! Each point snaps to the nearest multiple of the grid size `m` on both
//! axes. Order and duplicates are preserved; the distinct cells are kept
//! alongside for diagnostics.

use log::info;
use std::collections::HashSet;

use crate::error::{CrowdError, Result};
use crate::{GridKey, Point};

/// A track snapped to a grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedTrack {
    points: Vec<Point>,
    cells: Vec<Point>,
    grid_size: f64,
}

impl RasterizedTrack {
    /// Rasterized points, in input order, duplicates kept.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Distinct rasterized locations in first-occurrence order.
    pub fn cells(&self) -> &[Point] {
        &self.cells
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Snap a single point to the grid.
pub fn snap(p: &Point, m: f64) -> Point {
    Point::new((p.x / m).round() * m, (p.y / m).round() * m)
}

/// Rasterize a track with grid size `m`.
///
/// Fails with `InvalidConfig` when `m` is not a positive finite number and
/// with `InsufficientData` when the track has fewer than 2 points.
///
/// # Example
/// ```
/// use crowdtrack::{rasterize, Point};
///
/// let track = vec![Point::new(0.4, 1.6), Point::new(2.2, 1.9), Point::new(2.4, 2.1)];
/// let raster = rasterize(&track, 1.0).unwrap();
/// assert_eq!(raster.points()[0], Point::new(0.0, 2.0));
/// assert_eq!(raster.len(), 3);
/// assert_eq!(raster.cells().len(), 2);
/// ```
pub fn rasterize(track: &[Point], m: f64) -> Result<RasterizedTrack> {
    if !(m > 0.0 && m.is_finite()) {
        return Err(CrowdError::invalid_config(
            "m",
            format!("grid size must be positive, got {}", m),
        ));
    }
    if track.len() < 2 {
        return Err(CrowdError::insufficient(
            "rasterization",
            format!("track has {} points, at least 2 required", track.len()),
        ));
    }

    let points: Vec<Point> = track.iter().map(|p| snap(p, m)).collect();

    let mut seen: HashSet<GridKey> = HashSet::with_capacity(points.len());
    let cells: Vec<Point> = points
        .iter()
        .filter(|p| seen.insert(p.key(m)))
        .copied()
        .collect();

    info!(
        "[Rasterize] {} points onto grid {} -> {} distinct cells",
        track.len(),
        m,
        cells.len()
    );

    Ok(RasterizedTrack {
        points,
        cells,
        grid_size: m,
    })
}
