//! Land-use probability table and location scoring.
//!
//! The table is the share of each land-use class inside a linear buffer of
//! radius `lag` around a track. Buffer areas are integrated on a square
//! lattice: every lattice cell whose centre lies within `lag` of the track
//! polyline contributes `spacing²` to the class of the polygon containing
//! that centre.

use geo::{EuclideanDistance, Line};
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CrowdError, Result};
use crate::landuse::{LandUseClass, LandUseLookup};
use crate::movement::MovementModel;
use crate::Point;

/// Probability of each land-use class near a track. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTable {
    probabilities: BTreeMap<LandUseClass, f64>,
    areas: BTreeMap<LandUseClass, f64>,
    buffer_area: f64,
}

impl LocationTable {
    /// Build the table from per-class areas.
    ///
    /// Areas are normalized by their total. Fails with `InsufficientData`
    /// when the total is not positive.
    ///
    /// # Example
    /// ```
    /// use crowdtrack::{LandUseClass, LocationTable};
    ///
    /// let urban = LandUseClass::from("urban");
    /// let rural = LandUseClass::from("rural");
    /// let table = LocationTable::from_areas(vec![(urban.clone(), 70.0), (rural, 30.0)]).unwrap();
    /// assert!((table.get(&urban) - 0.7).abs() < 1e-12);
    /// ```
    pub fn from_areas<I>(areas: I) -> Result<Self>
    where
        I: IntoIterator<Item = (LandUseClass, f64)>,
    {
        let mut merged: BTreeMap<LandUseClass, f64> = BTreeMap::new();
        for (class, area) in areas {
            if area.is_finite() && area > 0.0 {
                *merged.entry(class).or_insert(0.0) += area;
            }
        }

        let total: f64 = merged.values().sum();
        if merged.is_empty() || total <= 0.0 {
            return Err(CrowdError::insufficient(
                "location table",
                "no land-use area inside the buffer",
            ));
        }

        let probabilities = merged
            .iter()
            .map(|(class, area)| (class.clone(), area / total))
            .collect();

        Ok(Self {
            probabilities,
            areas: merged,
            buffer_area: total,
        })
    }

    /// Build the table for the buffer of radius `lag` around `track`.
    ///
    /// `spacing` is the lattice step. Fails with `InsufficientData` for tracks
    /// with fewer than 2 points or when no lattice cell is classified.
    pub fn from_track<L>(track: &[Point], lookup: &L, lag: f64, spacing: f64) -> Result<Self>
    where
        L: LandUseLookup + ?Sized,
    {
        if track.len() < 2 {
            return Err(CrowdError::insufficient(
                "location table",
                format!("track has {} points, at least 2 required", track.len()),
            ));
        }
        if !(lag > 0.0 && spacing > 0.0) {
            return Err(CrowdError::insufficient(
                "location table",
                format!("zero-area buffer (lag={}, spacing={})", lag, spacing),
            ));
        }

        let cells = buffer_cells(track, lag, spacing);
        let centres: Vec<Point> = cells
            .iter()
            .map(|&(i, j)| cell_centre(i, j, spacing))
            .collect();

        #[cfg(feature = "parallel")]
        let classes: Vec<Option<LandUseClass>> = centres
            .par_iter()
            .map(|c| lookup.classify(c, 0.0))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let classes: Vec<Option<LandUseClass>> =
            centres.iter().map(|c| lookup.classify(c, 0.0)).collect();

        let cell_area = spacing * spacing;
        let classified = classes.iter().filter(|c| c.is_some()).count();
        debug!(
            "[Location] buffer lag={} spacing={}: {} cells, {} classified",
            lag,
            spacing,
            cells.len(),
            classified
        );

        let mut table = Self::from_areas(
            classes
                .into_iter()
                .flatten()
                .map(|class| (class, cell_area)),
        )?;
        table.buffer_area = cells.len() as f64 * cell_area;
        Ok(table)
    }

    /// Probability of `class`, 0 if absent.
    pub fn get(&self, class: &LandUseClass) -> f64 {
        self.probabilities.get(class).copied().unwrap_or(0.0)
    }

    /// Classified area of `class`, 0 if absent.
    pub fn class_area(&self, class: &LandUseClass) -> f64 {
        self.areas.get(class).copied().unwrap_or(0.0)
    }

    /// Area of the integrated buffer, classified or not.
    pub fn buffer_area(&self) -> f64 {
        self.buffer_area
    }

    /// Classes in sorted order.
    pub fn classes(&self) -> impl Iterator<Item = &LandUseClass> {
        self.probabilities.keys()
    }

    /// `(class, probability)` in sorted class order.
    pub fn iter(&self) -> impl Iterator<Item = (&LandUseClass, f64)> {
        self.probabilities.iter().map(|(c, p)| (c, *p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

fn cell_centre(i: i64, j: i64, spacing: f64) -> Point {
    Point::new((i as f64 + 0.5) * spacing, (j as f64 + 0.5) * spacing)
}

/// Lattice cells whose centre lies within `lag` of the track polyline.
///
/// Each segment only scans its own padded bounding box, so the cost grows
/// with track length rather than with the track's overall extent.
fn buffer_cells(track: &[Point], lag: f64, spacing: f64) -> BTreeSet<(i64, i64)> {
    let mut cells = BTreeSet::new();
    for w in track.windows(2) {
        let segment = Line::new(geo::Coord::from(w[0]), geo::Coord::from(w[1]));
        let min_i = ((w[0].x.min(w[1].x) - lag) / spacing).floor() as i64;
        let max_i = ((w[0].x.max(w[1].x) + lag) / spacing).ceil() as i64;
        let min_j = ((w[0].y.min(w[1].y) - lag) / spacing).floor() as i64;
        let max_j = ((w[0].y.max(w[1].y) + lag) / spacing).ceil() as i64;

        for i in min_i..=max_i {
            for j in min_j..=max_j {
                if cells.contains(&(i, j)) {
                    continue;
                }
                let centre = geo::Point::from(cell_centre(i, j, spacing));
                if centre.euclidean_distance(&segment) <= lag {
                    cells.insert((i, j));
                }
            }
        }
    }
    cells
}

/// Land-use probability of the location reached by moving `v` from `end`.
///
/// The candidate is classified with radius `lag`; unknown or unlisted classes
/// score 0.
pub fn loc_prob<L>(v: &Point, end: &Point, table: &LocationTable, lookup: &L, lag: f64) -> f64
where
    L: LandUseLookup + ?Sized,
{
    let candidate = *end + *v;
    lookup
        .classify(&candidate, lag)
        .map(|class| table.get(&class))
        .unwrap_or(0.0)
}

/// Combined sampling weight: `move_prob(v) × loc_prob(v, end)`.
pub fn probability<L>(
    v: &Point,
    movement: &MovementModel,
    end: &Point,
    table: &LocationTable,
    lookup: &L,
    lag: f64,
) -> f64
where
    L: LandUseLookup + ?Sized,
{
    movement.move_prob(v) * loc_prob(v, end, table, lookup, lag)
}
