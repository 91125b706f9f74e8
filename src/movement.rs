//! Empirical distribution over consecutive displacement vectors.
//!
//! Vectors are compared through [`GridKey`] at the model's resolution, so a
//! vector that drifted by floating-point noise still counts as the same
//! movement.

use std::collections::HashMap;

use crate::error::{CrowdError, Result};
use crate::{GridKey, Point};

/// Displacement list and deduplicated vector set of a track.
#[derive(Debug, Clone)]
pub struct MovementModel {
    displacements: Vec<Point>,
    vector_set: Vec<Point>,
    counts: HashMap<GridKey, usize>,
    resolution: f64,
}

/// Consecutive differences `track[i+1] - track[i]`.
pub fn displacements(track: &[Point]) -> Vec<Point> {
    track.windows(2).map(|w| w[1] - w[0]).collect()
}

impl MovementModel {
    /// Build the model from a track.
    ///
    /// `resolution` is the grid used to key vectors; pass the grid size for
    /// rasterized tracks. Fails with `InsufficientData` when the track yields
    /// no displacement.
    pub fn from_track(track: &[Point], resolution: f64) -> Result<Self> {
        let displacements = displacements(track);
        if displacements.is_empty() {
            return Err(CrowdError::insufficient(
                "movement model",
                format!("track has {} points, at least 2 required", track.len()),
            ));
        }

        let mut counts: HashMap<GridKey, usize> = HashMap::new();
        let mut vector_set = Vec::new();
        for v in &displacements {
            let count = counts.entry(v.key(resolution)).or_insert(0);
            if *count == 0 {
                vector_set.push(*v);
            }
            *count += 1;
        }

        Ok(Self {
            displacements,
            vector_set,
            counts,
            resolution,
        })
    }

    /// All n-1 displacement vectors in track order.
    pub fn displacements(&self) -> &[Point] {
        &self.displacements
    }

    /// Distinct vectors in first-occurrence order.
    pub fn vector_set(&self) -> &[Point] {
        &self.vector_set
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Number of displacements matching `v`.
    pub fn count(&self, v: &Point) -> usize {
        self.counts
            .get(&v.key(self.resolution))
            .copied()
            .unwrap_or(0)
    }

    /// Share of displacements matching `v`.
    pub fn move_prob(&self, v: &Point) -> f64 {
        self.count(v) as f64 / self.displacements.len() as f64
    }

    /// `(vector, probability)` over the vector set. Sums to 1.
    pub fn distribution(&self) -> Vec<(Point, f64)> {
        self.vector_set
            .iter()
            .map(|v| (*v, self.move_prob(v)))
            .collect()
    }
}
