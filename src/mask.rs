//! Template masking.
//!
//! Every point of the extended track is replaced by a run of decoys taken
//! from a von Neumann (diamond) template that was re-centred at random and
//! scaled by the grid size. The true point is placed at a uniformly random
//! position inside its run, exactly once, so nothing in the output marks it.

use log::{debug, info};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::HashSet;

use crate::error::{CrowdError, Result};
use crate::{GridKey, Point};

/// All integer offsets `(x, y)` with `|x| + |y| <= r`.
///
/// `x` ascends in the outer loop and `y` in the inner one. The template has
/// `2r² + 2r + 1` points.
///
/// # Example
/// ```
/// use crowdtrack::vn_template;
/// assert_eq!(vn_template(1).len(), 5);
/// assert_eq!(vn_template(2).len(), 13);
/// ```
pub fn vn_template(r: u32) -> Vec<Point> {
    let r = r as i64;
    let mut template = Vec::new();
    for x in -r..=r {
        for y in -r..=r {
            if x.abs() + y.abs() <= r {
                template.push(Point::new(x as f64, y as f64));
            }
        }
    }
    template
}

/// Re-centre a template on one of its own points.
///
/// The new origin is drawn with weight `max(|x|, |y|) + 1`, which favours the
/// periphery; every offset is then shifted by it.
pub fn random_shift<R: Rng + ?Sized>(template: &[Point], rng: &mut R) -> Vec<Point> {
    let weights = template.iter().map(|p| p.x.abs().max(p.y.abs()) + 1.0);
    let dist = match WeightedIndex::new(weights) {
        Ok(d) => d,
        Err(_) => return template.to_vec(),
    };
    let origin = template[dist.sample(rng)];
    template.iter().map(|p| *p - origin).collect()
}

/// Scale offsets by the grid size and translate them onto `point`.
pub fn apply_template(point: &Point, template: &[Point], m: f64) -> Vec<Point> {
    template.iter().map(|o| *point + o.scale(m)).collect()
}

/// Decoys plus the true point for one input point.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedRun {
    points: Vec<Point>,
}

impl MaskedRun {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of entries equal to `p`.
    pub fn count_of(&self, p: &Point) -> usize {
        self.points.iter().filter(|q| *q == p).count()
    }
}

/// Runs in the order of the input track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaskedTrack {
    runs: Vec<MaskedRun>,
}

impl MaskedTrack {
    pub fn runs(&self) -> &[MaskedRun] {
        &self.runs
    }

    /// Number of runs, one per input point.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total number of emitted points.
    pub fn point_count(&self) -> usize {
        self.runs.iter().map(MaskedRun::len).sum()
    }

    /// Concatenation of all runs.
    pub fn points(&self) -> Vec<Point> {
        self.runs
            .iter()
            .flat_map(|run| run.points.iter().copied())
            .collect()
    }
}

/// Mask every point of `track` with a freshly shifted template of radius `r`
/// scaled by `m`.
///
/// Decoys already emitted in the preceding run are dropped, so consecutive
/// runs never repeat a decoy. Fails with `InvalidConfig` when `m` is not a
/// positive finite number.
pub fn mask_track<R: Rng + ?Sized>(
    track: &[Point],
    m: f64,
    r: u32,
    rng: &mut R,
) -> Result<MaskedTrack> {
    if !(m > 0.0 && m.is_finite()) {
        return Err(CrowdError::invalid_config(
            "m",
            format!("grid size must be positive, got {}", m),
        ));
    }

    let template = vn_template(r);
    let mut runs = Vec::with_capacity(track.len());
    let mut previous: HashSet<GridKey> = HashSet::new();

    for (i, v) in track.iter().enumerate() {
        let own_key = v.key(m);
        let candidates = apply_template(v, &random_shift(&template, rng), m);

        let mut points: Vec<Point> = candidates
            .into_iter()
            .filter(|c| {
                let key = c.key(m);
                key != own_key && !previous.contains(&key)
            })
            .collect();
        let slot = rng.gen_range(0..=points.len());
        points.insert(slot, *v);

        debug!("[Mask] point {}: run of {} points", i, points.len());
        previous = points.iter().map(|p| p.key(m)).collect();
        runs.push(MaskedRun { points });
    }

    let masked = MaskedTrack { runs };
    info!(
        "[Mask] {} masked points from {} track points",
        masked.point_count(),
        track.len()
    );
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shift_keeps_shape() {
        let template = vn_template(2);
        let mut rng = StdRng::seed_from_u64(3);
        let shifted = random_shift(&template, &mut rng);
        assert_eq!(shifted.len(), template.len());
        // Pairwise differences are translation invariant
        let d0 = template[1] - template[0];
        let d1 = shifted[1] - shifted[0];
        assert_eq!(d0, d1);
        assert!(shifted.contains(&Point::ORIGIN));
    }

    #[test]
    fn test_shift_prefers_periphery() {
        let template = vn_template(1);
        let mut rng = StdRng::seed_from_u64(11);
        let mut centre_kept = 0;
        for _ in 0..2000 {
            let shifted = random_shift(&template, &mut rng);
            // Origin chosen at the centre leaves (0,0) offset at index 2
            if shifted[2] == Point::ORIGIN {
                centre_kept += 1;
            }
        }
        // Centre weight 1 of total 9
        assert!(centre_kept > 100 && centre_kept < 350);
    }
}
