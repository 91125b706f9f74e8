//! The crowding pipeline: rasterize, extend, mask.
//!
//! Stages run strictly in sequence and each consumes the previous stage's
//! full output. All randomness comes from one RNG, seeded from
//! [`CrowdConfig::seed`] when set.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CrowdError, Result};
use crate::extend::{requested_extension_len, ExtensionStep, TrackExtender};
use crate::geo_utils::CrowdParameters;
use crate::landuse::LandUseLookup;
use crate::location::LocationTable;
use crate::mask::{mask_track, MaskedTrack};
use crate::movement::MovementModel;
use crate::quantize::{rasterize, RasterizedTrack};
use crate::{CrowdConfig, Point};

/// Everything the pipeline produced for one track.
#[derive(Debug, Clone)]
pub struct CrowdOutput {
    /// Derived `d`, `m` and `r`
    pub parameters: CrowdParameters,
    /// Input track snapped to the grid
    pub rasterized: RasterizedTrack,
    /// Land-use probabilities around the input track
    pub table: LocationTable,
    /// Number of points the extension was asked for
    pub requested: usize,
    /// Rasterized track with synthetic points appended
    pub extended: Vec<Point>,
    /// Outcome of each requested extension point
    pub steps: Vec<ExtensionStep>,
    /// Decoy runs for every point of `extended`
    pub masked: MaskedTrack,
}

/// Run the pipeline with an RNG seeded from `config.seed`, or from system
/// entropy when no seed is set.
pub fn crowd<L>(track: &[Point], lookup: &L, config: &CrowdConfig) -> Result<CrowdOutput>
where
    L: LandUseLookup + ?Sized,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    crowd_with_rng(track, lookup, config, &mut rng)
}

/// Run the pipeline with a caller-supplied RNG. `config.seed` is ignored.
pub fn crowd_with_rng<L, R>(
    track: &[Point],
    lookup: &L,
    config: &CrowdConfig,
    rng: &mut R,
) -> Result<CrowdOutput>
where
    L: LandUseLookup + ?Sized,
    R: Rng + ?Sized,
{
    config.validate()?;

    let points: Vec<Point> = track.iter().filter(|p| p.is_valid()).copied().collect();
    if points.len() != track.len() {
        warn!(
            "[Crowd] dropped {} points with non-finite coordinates",
            track.len() - points.len()
        );
    }
    if points.len() < 2 {
        return Err(CrowdError::insufficient(
            "crowding",
            format!("track has {} valid points, at least 2 required", points.len()),
        ));
    }

    info!("[Crowd] crowding track of {} points", points.len());
    let parameters = CrowdParameters::derive(&points, config.k)?;

    let rasterized = rasterize(&points, parameters.m)?;
    let movement = MovementModel::from_track(rasterized.points(), parameters.m)?;
    let table = LocationTable::from_track(&points, lookup, config.lag, config.spacing())?;
    info!(
        "[Crowd] {} land-use classes within lag {}",
        table.len(),
        config.lag
    );

    let requested = requested_extension_len(rasterized.len(), rng);
    let extension = TrackExtender::new(rasterized.points(), &movement, &table, lookup, config)
        .extend(requested, rng);

    let masked = mask_track(&extension.track, parameters.m, parameters.r, rng)?;

    Ok(CrowdOutput {
        parameters,
        rasterized,
        table,
        requested,
        extended: extension.track,
        steps: extension.steps,
        masked,
    })
}
