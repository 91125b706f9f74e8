//! # Crowd Track
//!
//! Trajectory obfuscation for single planar tracks.
//!
//! This library provides:
//! - Grid rasterization of a track
//! - Movement and land-use probability models built from the track itself
//! - Chi-square similarity between tracks
//! - Track extension ("mimicry") gated by that similarity
//! - Point masking with randomly re-centred von Neumann templates
//!
//! Coordinates are planar and already projected (metres, or any linear unit
//! shared by the track, the land-use layer and `lag`).
//!
//! ## Features
//!
//! - **`parallel`** - Classify location-table lattice cells with rayon
//! - **`cli`** - Build the `crowdtrack-cli` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use crowdtrack::{crowd, CrowdConfig, LandUseLayer, Point};
//! use geo::{LineString, Polygon};
//!
//! let square = Polygon::new(
//!     LineString::from(vec![(-500.0, -500.0), (500.0, -500.0), (500.0, 500.0), (-500.0, 500.0)]),
//!     vec![],
//! );
//! let land = LandUseLayer::new(vec![("urban".into(), square)]);
//!
//! let track: Vec<Point> = (0..8).map(|i| Point::new(i as f64 * 20.0, 0.0)).collect();
//! let config = CrowdConfig { seed: Some(7), ..CrowdConfig::default() };
//!
//! let output = crowd(&track, &land, &config).unwrap();
//! assert_eq!(output.masked.len(), output.extended.len());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{CrowdError, OptionExt, Result};

// Planar vector helpers and crowding parameters
pub mod geo_utils;
pub use geo_utils::CrowdParameters;

// Grid rasterization
pub mod quantize;
pub use quantize::{rasterize, RasterizedTrack};

// Displacement vectors and movement probabilities
pub mod movement;
pub use movement::MovementModel;

// Land-use classification capability and polygon layer
pub mod landuse;
pub use landuse::{LandUseClass, LandUseLayer, LandUseLookup};

// Land-use probability table and location scoring
pub mod location;
pub use location::{loc_prob, probability, LocationTable};

// Contingency-table similarity
pub mod similarity;
pub use similarity::{
    chi2_contingency, combined_similarity, location_similarity, move_similarity, ChiSquareResult,
};

// Track extension (mimicry)
pub mod extend;
pub use extend::{requested_extension_len, Extension, ExtensionStep, TrackExtender};

// Template masking
pub mod mask;
pub use mask::{apply_template, mask_track, random_shift, vn_template, MaskedRun, MaskedTrack};

// Full pipeline
pub mod crowd;
pub use crowd::{crowd, crowd_with_rng, CrowdOutput};

// Seeded synthetic tracks and land-use grids for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A planar coordinate pair in a projected reference system.
///
/// Also used as a displacement vector `(dx, dy)`.
///
/// # Example
/// ```
/// use crowdtrack::Point;
/// let a = Point::new(10.0, 5.0);
/// let b = Point::new(12.0, 9.0);
/// assert_eq!(b - a, Point::new(2.0, 4.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check if both coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Multiply both coordinates by a scalar.
    pub fn scale(&self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Hashable key of this point at the given resolution.
    pub fn key(&self, resolution: f64) -> GridKey {
        GridKey::of(self, resolution)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        geo::Coord { x: p.x, y: p.y }
    }
}

impl From<Point> for geo::Point<f64> {
    fn from(p: Point) -> Self {
        geo::Point::new(p.x, p.y)
    }
}

/// Integer key of a coordinate pair rounded to a resolution.
///
/// Used wherever two points or vectors are compared for equality, so that
/// values differing only by floating-point noise collapse to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey(pub i64, pub i64);

impl GridKey {
    /// Key of `p` at `resolution`. Non-positive resolutions fall back to 1.
    pub fn of(p: &Point, resolution: f64) -> Self {
        let res = if resolution > 0.0 && resolution.is_finite() {
            resolution
        } else {
            1.0
        };
        GridKey((p.x / res).round() as i64, (p.y / res).round() as i64)
    }
}

/// Configuration for the crowding pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdConfig {
    /// Target decoy count per point. Drives grid size and template radius.
    /// Default: 10
    pub k: u32,

    /// Similarity acceptance threshold for extension candidates.
    /// Compared against the sum of two p-values.
    /// Default: 0.02
    pub p: f64,

    /// Buffer radius for land-use sampling, in coordinate units.
    /// Default: 50.0
    pub lag: f64,

    /// Lattice step used to integrate buffer areas.
    /// `None` uses `lag / 8`.
    #[serde(default)]
    pub sample_spacing: Option<f64>,

    /// RNG seed. `None` draws from system entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            k: 10,
            p: 0.02,
            lag: 50.0,
            sample_spacing: None,
            seed: None,
        }
    }
}

impl CrowdConfig {
    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.k < 1 {
            return Err(CrowdError::invalid_config("k", "must be at least 1"));
        }
        if !(self.p > 0.0 && self.p < 1.0) {
            return Err(CrowdError::invalid_config(
                "p",
                format!("must lie in (0, 1), got {}", self.p),
            ));
        }
        if !(self.lag > 0.0 && self.lag.is_finite()) {
            return Err(CrowdError::invalid_config(
                "lag",
                format!("must be positive, got {}", self.lag),
            ));
        }
        if let Some(spacing) = self.sample_spacing {
            if !(spacing > 0.0 && spacing.is_finite()) {
                return Err(CrowdError::invalid_config(
                    "sample_spacing",
                    format!("must be positive, got {}", spacing),
                ));
            }
        }
        Ok(())
    }

    /// Lattice step for buffer integration.
    pub fn spacing(&self) -> f64 {
        self.sample_spacing.unwrap_or(self.lag / 8.0)
    }
}
