//! Synthetic tracks and land-use layers for testing and benchmarking.
//!
//! Generates seeded planar tracks together with a land-use layer of square
//! parcels covering them, so the full pipeline can run without external
//! data.
//!
//! # Example
//!
//! ```rust
//! use crowdtrack::synthetic::{LandUseGrid, SyntheticScenario, TrackPattern};
//! use crowdtrack::Point;
//!
//! let scenario = SyntheticScenario {
//!     origin: Point::new(155_000.0, 463_000.0),
//!     steps: 40,
//!     step_length: 25.0,
//!     pattern: TrackPattern::Lattice,
//!     noise_sigma: 0.0,
//!     land: LandUseGrid::default(),
//!     seed: 42,
//! };
//!
//! let dataset = scenario.generate();
//! assert_eq!(dataset.track.len(), 41);
//! assert!(!dataset.land.is_empty());
//! ```

use geo::{LineString, Polygon};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

use crate::landuse::{LandUseClass, LandUseLayer};
use crate::Point;

// ============================================================================
// Types
// ============================================================================

/// Shape of the generated track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackPattern {
    /// Straight line with minor heading drift.
    Straight,
    /// Winding path, at most ~30deg heading change per step.
    Winding,
    /// Closed loop returning near its start.
    Loop,
    /// Axis-aligned steps on a street lattice, never reversing.
    Lattice,
}

/// Square land-use parcels laid over the track.
#[derive(Debug, Clone)]
pub struct LandUseGrid {
    /// Side of each parcel.
    pub cell_size: f64,
    /// Padding around the track's bounding box.
    pub margin: f64,
    /// Classes assigned to parcels at random.
    pub classes: Vec<String>,
}

impl Default for LandUseGrid {
    fn default() -> Self {
        Self {
            cell_size: 100.0,
            margin: 200.0,
            classes: vec![
                "residential".to_string(),
                "commercial".to_string(),
                "park".to_string(),
            ],
        }
    }
}

/// A generated track with its land-use layer.
pub struct SyntheticDataset {
    pub track: Vec<Point>,
    pub land: LandUseLayer,
    /// Number of parcels in `land`.
    pub parcel_count: usize,
}

/// Scenario configuration for generating synthetic data.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// First point of the track.
    pub origin: Point,
    /// Number of steps; the track has `steps + 1` points.
    pub steps: usize,
    /// Distance covered per step.
    pub step_length: f64,
    pub pattern: TrackPattern,
    /// Gaussian noise standard deviation added to every point.
    pub noise_sigma: f64,
    pub land: LandUseGrid,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Track Generation
// ============================================================================

fn generate_heading_track(
    origin: &Point,
    steps: usize,
    step_length: f64,
    pattern: TrackPattern,
    rng: &mut StdRng,
) -> Vec<Point> {
    let mut points = Vec::with_capacity(steps + 1);
    let mut heading: f64 = rng.gen_range(0.0..(2.0 * PI));
    let mut current = *origin;
    points.push(current);

    for i in 0..steps {
        heading += match pattern {
            TrackPattern::Straight => rng.gen_range(-0.02..0.02),
            TrackPattern::Winding => {
                let base_turn = (i as f64 * 0.1).sin() * 0.3;
                base_turn + rng.gen_range(-0.15..0.15)
            }
            TrackPattern::Loop => 2.0 * PI / steps as f64 + rng.gen_range(-0.05..0.05),
            TrackPattern::Lattice => 0.0,
        };
        current = Point::new(
            current.x + step_length * heading.cos(),
            current.y + step_length * heading.sin(),
        );
        points.push(current);
    }

    points
}

const LATTICE_DIRECTIONS: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

fn generate_lattice_track(
    origin: &Point,
    steps: usize,
    step_length: f64,
    rng: &mut StdRng,
) -> Vec<Point> {
    let mut points = Vec::with_capacity(steps + 1);
    let mut current = *origin;
    let mut direction = rng.gen_range(0..4usize);
    points.push(current);

    for _ in 0..steps {
        // Mostly keep going, sometimes turn left or right
        let roll: f64 = rng.gen_range(0.0..1.0);
        if roll < 0.2 {
            direction = (direction + 1) % 4;
        } else if roll < 0.4 {
            direction = (direction + 3) % 4;
        }
        let (dx, dy) = LATTICE_DIRECTIONS[direction];
        current = Point::new(current.x + dx * step_length, current.y + dy * step_length);
        points.push(current);
    }

    points
}

/// Add Gaussian noise to every point.
fn add_noise(points: &[Point], sigma: f64, rng: &mut StdRng) -> Vec<Point> {
    if sigma <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            // Box-Muller transform
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
            Point::new(p.x + z0 * sigma, p.y + z1 * sigma)
        })
        .collect()
}

// ============================================================================
// Land-use Generation
// ============================================================================

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

fn generate_parcels(
    track: &[Point],
    grid: &LandUseGrid,
    rng: &mut StdRng,
) -> Vec<(LandUseClass, Polygon<f64>)> {
    if track.is_empty() || grid.classes.is_empty() || grid.cell_size <= 0.0 {
        return Vec::new();
    }

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for p in track {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let size = grid.cell_size;
    let i0 = ((min_x - grid.margin) / size).floor() as i64;
    let i1 = ((max_x + grid.margin) / size).ceil() as i64;
    let j0 = ((min_y - grid.margin) / size).floor() as i64;
    let j1 = ((max_y + grid.margin) / size).ceil() as i64;

    let mut parcels = Vec::new();
    for i in i0..i1 {
        for j in j0..j1 {
            let class = &grid.classes[rng.gen_range(0..grid.classes.len())];
            parcels.push((
                LandUseClass::from(class.as_str()),
                square(i as f64 * size, j as f64 * size, size),
            ));
        }
    }
    parcels
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate the track and its land-use layer.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let clean = match self.pattern {
            TrackPattern::Lattice => {
                generate_lattice_track(&self.origin, self.steps, self.step_length, &mut rng)
            }
            pattern => generate_heading_track(
                &self.origin,
                self.steps,
                self.step_length,
                pattern,
                &mut rng,
            ),
        };
        let track = add_noise(&clean, self.noise_sigma, &mut rng);

        let parcels = generate_parcels(&track, &self.land, &mut rng);
        let parcel_count = parcels.len();

        SyntheticDataset {
            track,
            land: LandUseLayer::new(parcels),
            parcel_count,
        }
    }

    /// City walk on a 25-unit street lattice with light noise.
    pub fn city_walk() -> Self {
        Self {
            origin: Point::new(155_000.0, 463_000.0),
            steps: 30,
            step_length: 25.0,
            pattern: TrackPattern::Lattice,
            noise_sigma: 1.0,
            land: LandUseGrid::default(),
            seed: 42,
        }
    }

    /// Winding rural ride with larger parcels.
    pub fn winding_ride() -> Self {
        Self {
            origin: Point::new(120_000.0, 480_000.0),
            steps: 60,
            step_length: 40.0,
            pattern: TrackPattern::Winding,
            noise_sigma: 3.0,
            land: LandUseGrid {
                cell_size: 250.0,
                margin: 300.0,
                classes: vec![
                    "agriculture".to_string(),
                    "forest".to_string(),
                    "water".to_string(),
                    "residential".to_string(),
                ],
            },
            seed: 7,
        }
    }

    /// Lattice walk of a given length, seeded by the length.
    pub fn with_steps(steps: usize) -> Self {
        Self {
            steps,
            seed: steps as u64 * 7919,
            ..Self::city_walk()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
