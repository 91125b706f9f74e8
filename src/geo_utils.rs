//! Planar geometry helpers and the derived crowding parameters.
//!
//! All distances are Euclidean in the projected coordinate system of the
//! track.

use log::info;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{CrowdError, OptionExt, Result};
use crate::Point;

/// Factor applied to the longest step to obtain the distance parameter `d`.
pub const DISTANCE_FACTOR: f64 = 1.3;

/// Distances between consecutive points.
pub fn step_distances(track: &[Point]) -> Vec<f64> {
    track.windows(2).map(|w| w[0].distance(&w[1])).collect()
}

/// Longest step between consecutive points.
///
/// Fails with `InsufficientData` for tracks with fewer than 2 points.
pub fn max_step_distance(track: &[Point]) -> Result<f64> {
    step_distances(track)
        .into_iter()
        .reduce(f64::max)
        .ok_or_insufficient_data("step distance", "track has fewer than 2 points")
}

/// Grid size for a distance parameter `d` and decoy count `k`.
///
/// `floor(d / sqrt(2k/π))`, clamped to at least 1 so short tracks still get
/// a usable grid.
pub fn grid_size(d: f64, k: u32) -> f64 {
    let raw = (d / (2.0 * k.max(1) as f64 / PI).sqrt()).floor();
    if raw >= 1.0 {
        raw
    } else {
        1.0
    }
}

/// Template radius for decoy count `k`: `ceil((-1 + sqrt(1 + 4k)) / 2)`.
pub fn template_radius(k: u32) -> u32 {
    ((-1.0 + (1.0 + 4.0 * k as f64).sqrt()) / 2.0).ceil() as u32
}

/// Number of offsets in a von Neumann template of radius `r`.
pub fn template_size(r: u32) -> usize {
    let r = r as usize;
    2 * r * r + 2 * r + 1
}

/// Parameters derived from the input track and `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrowdParameters {
    /// Distance parameter: 1.3 × longest step
    pub d: f64,
    /// Grid size (rounding increment)
    pub m: f64,
    /// Template radius
    pub r: u32,
}

impl CrowdParameters {
    /// Derive `d`, `m` and `r` for a track.
    ///
    /// # Example
    /// ```
    /// use crowdtrack::{CrowdParameters, Point};
    ///
    /// let track = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)];
    /// let params = CrowdParameters::derive(&track, 4).unwrap();
    /// assert_eq!(params.m, 1.0);
    /// assert_eq!(params.r, 2);
    /// ```
    pub fn derive(track: &[Point], k: u32) -> Result<Self> {
        let d = DISTANCE_FACTOR * max_step_distance(track)?;
        if d <= 0.0 {
            return Err(CrowdError::insufficient(
                "crowding parameters",
                "all consecutive points coincide",
            ));
        }
        let m = grid_size(d, k);
        let r = template_radius(k);
        info!(
            "[Crowd] distance parameter d={:.3}, grid size m={}, template radius r={}",
            d, m, r
        );
        Ok(Self { d, m, r })
    }
}
