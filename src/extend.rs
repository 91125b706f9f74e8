//! Track extension by movement mimicry.
//!
//! Synthetic points are appended to one end of the rasterized track. Each
//! step draws a displacement vector from the track's own vector set, weighted
//! by movement probability × land-use probability at the landing point. A
//! candidate is only committed if it is new to the track and the extended
//! track stays similar to the reference (combined similarity above `p`).
//!
//! Every requested point yields an [`ExtensionStep`]; exhausting the vector
//! set is recorded and the loop moves on.

use log::{debug, info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::HashSet;

use crate::landuse::LandUseLookup;
use crate::location::{probability, LocationTable};
use crate::movement::MovementModel;
use crate::similarity::SimilarityTester;
use crate::{CrowdConfig, GridKey, Point};

/// Share of the track length that bounds the requested extension.
pub const EXTENSION_FRACTION: f64 = 0.8;

/// Outcome of one requested extension point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtensionStep {
    /// A candidate passed the gate and was appended.
    Appended(Point),
    /// No vector produced an acceptable candidate.
    NoCandidateFound,
}

impl ExtensionStep {
    pub fn is_appended(&self) -> bool {
        matches!(self, ExtensionStep::Appended(_))
    }
}

/// Extended track plus the per-step outcomes.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    /// Reference track with accepted points appended in order
    pub track: Vec<Point>,
    pub steps: Vec<ExtensionStep>,
}

impl Extension {
    /// Number of appended points.
    pub fn appended(&self) -> usize {
        self.steps.iter().filter(|s| s.is_appended()).count()
    }

    /// Number of steps that found no candidate.
    pub fn failures(&self) -> usize {
        self.steps.len() - self.appended()
    }
}

/// Draw the number of points to append: uniform in
/// `[1, floor(0.8 × track_len)]`, at least 1.
pub fn requested_extension_len<R: Rng + ?Sized>(track_len: usize, rng: &mut R) -> usize {
    let upper = ((EXTENSION_FRACTION * track_len as f64).floor() as usize).max(1);
    rng.gen_range(1..=upper)
}

/// Normalize weights to a distribution.
///
/// When every weight is zero, `f64::EPSILON` is added to each first, which
/// turns the result uniform.
pub fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        let shifted: Vec<f64> = weights.iter().map(|w| w + f64::EPSILON).collect();
        let total: f64 = shifted.iter().sum();
        shifted.iter().map(|w| w / total).collect()
    }
}

/// Appends synthetic points to a rasterized track.
pub struct TrackExtender<'a, L: LandUseLookup + ?Sized> {
    reference: &'a [Point],
    movement: &'a MovementModel,
    table: &'a LocationTable,
    lookup: &'a L,
    tester: SimilarityTester<'a, L>,
    lag: f64,
    threshold: f64,
}

impl<'a, L: LandUseLookup + ?Sized> TrackExtender<'a, L> {
    /// `reference` is the rasterized track, `movement` its model.
    pub fn new(
        reference: &'a [Point],
        movement: &'a MovementModel,
        table: &'a LocationTable,
        lookup: &'a L,
        config: &CrowdConfig,
    ) -> Self {
        Self {
            reference,
            movement,
            table,
            lookup,
            tester: SimilarityTester::new(movement, table, lookup, config.lag, config.spacing()),
            lag: config.lag,
            threshold: config.p,
        }
    }

    /// Raw weight `move_prob × loc_prob` of every vector, leaving `end`.
    pub fn weights(&self, end: &Point) -> Vec<f64> {
        self.movement
            .vector_set()
            .iter()
            .map(|v| probability(v, self.movement, end, self.table, self.lookup, self.lag))
            .collect()
    }

    /// Normalized sampling distribution over the vector set, leaving `end`.
    pub fn sampling_distribution(&self, end: &Point) -> Vec<(Point, f64)> {
        let probs = normalize_weights(&self.weights(end));
        self.movement
            .vector_set()
            .iter()
            .copied()
            .zip(probs)
            .collect()
    }

    /// Append up to `requested` points.
    pub fn extend<R: Rng + ?Sized>(&self, requested: usize, rng: &mut R) -> Extension {
        let resolution = self.movement.resolution();
        let mut faketrack: Vec<Point> = self.reference.to_vec();
        let mut occupied: HashSet<GridKey> =
            faketrack.iter().map(|p| p.key(resolution)).collect();
        let mut steps = Vec::with_capacity(requested);

        info!(
            "[Extend] extending {} points by up to {} (vector set {})",
            faketrack.len(),
            requested,
            self.movement.vector_set().len()
        );

        for step in 0..requested {
            let Some(&end) = faketrack.last() else {
                steps.push(ExtensionStep::NoCandidateFound);
                continue;
            };

            let outcome = self.next_point(&faketrack, &occupied, &end, rng);
            match outcome {
                ExtensionStep::Appended(candidate) => {
                    debug!(
                        "[Extend] step {}: appended ({:.3}, {:.3})",
                        step, candidate.x, candidate.y
                    );
                    occupied.insert(candidate.key(resolution));
                    faketrack.push(candidate);
                }
                ExtensionStep::NoCandidateFound => {
                    warn!("[Extend] step {}: no sufficiently similar candidate", step);
                }
            }
            steps.push(outcome);
        }

        let extension = Extension {
            track: faketrack,
            steps,
        };
        info!(
            "[Extend] appended {} of {} requested points",
            extension.appended(),
            requested
        );
        extension
    }

    /// One requested point: weighted draws without replacement until a
    /// candidate passes, or the vector set runs out.
    fn next_point<R: Rng + ?Sized>(
        &self,
        faketrack: &[Point],
        occupied: &HashSet<GridKey>,
        end: &Point,
        rng: &mut R,
    ) -> ExtensionStep {
        let resolution = self.movement.resolution();
        let vectors = self.movement.vector_set();
        let mut pool: Vec<usize> = (0..vectors.len()).collect();
        let mut pool_weights = self.weights(end);
        let mut tentative: Vec<Point> = Vec::with_capacity(faketrack.len() + 1);

        while !pool.is_empty() {
            let dist = match WeightedIndex::new(normalize_weights(&pool_weights)) {
                Ok(d) => d,
                Err(e) => {
                    debug!("[Extend] weighted draw unavailable: {}", e);
                    break;
                }
            };
            let pick = dist.sample(rng);
            let v = vectors[pool.swap_remove(pick)];
            pool_weights.swap_remove(pick);

            let candidate = *end + v;
            if occupied.contains(&candidate.key(resolution)) {
                continue;
            }

            tentative.clear();
            tentative.extend_from_slice(faketrack);
            tentative.push(candidate);
            let score = self.tester.combined(&tentative);
            if score > self.threshold {
                return ExtensionStep::Appended(candidate);
            }
            debug!(
                "[Extend] rejected ({:.3}, {:.3}): similarity {:.4} <= {}",
                candidate.x, candidate.y, score, self.threshold
            );
        }

        ExtensionStep::NoCandidateFound
    }
}
