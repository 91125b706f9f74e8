//! Track similarity through chi-square contingency tests.
//!
//! Two distributions (movement vectors, or land-use classes) are laid out as
//! the two columns of a contingency table and tested for independence. The
//! p-value is the similarity: near 1 the distributions are
//! indistinguishable, near 0 they diverge.
//!
//! The combined score is `move_similarity + location_similarity`, a sum of
//! two p-values. It is not a probability; the acceptance threshold `p` is
//! calibrated against exactly this sum.

use log::debug;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeSet;

use crate::error::{CrowdError, Result};
use crate::landuse::{LandUseClass, LandUseLookup};
use crate::location::LocationTable;
use crate::movement::MovementModel;
use crate::Point;

/// Outcome of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    /// Expected frequencies under independence
    pub expected: Vec<Vec<f64>>,
}

/// Pearson chi-square test of independence on a contingency table.
///
/// Expected frequencies come from the marginals. With one degree of freedom
/// Yates' continuity correction is applied: each observation moves towards
/// its expectation by `min(0.5, |o - e|)`. With zero degrees of freedom the
/// statistic is 0 and the p-value 1.
///
/// Fails with `DegenerateContingencyTable` for empty or ragged tables,
/// negative or non-finite entries, and any all-zero row or column.
///
/// # Example
/// ```
/// use crowdtrack::chi2_contingency;
///
/// let result = chi2_contingency(&[[10.0, 10.0], [20.0, 20.0], [30.0, 30.0]]).unwrap();
/// assert_eq!(result.dof, 2);
/// assert!((result.p_value - 1.0).abs() < 1e-9);
/// ```
pub fn chi2_contingency<R: AsRef<[f64]>>(rows: &[R]) -> Result<ChiSquareResult> {
    let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
    if rows.is_empty() || ncols == 0 {
        return Err(CrowdError::degenerate("empty table"));
    }
    if rows.iter().any(|r| r.as_ref().len() != ncols) {
        return Err(CrowdError::degenerate("rows differ in length"));
    }
    if rows
        .iter()
        .flat_map(|r| r.as_ref().iter())
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(CrowdError::degenerate("negative or non-finite entry"));
    }

    let row_sums: Vec<f64> = rows.iter().map(|r| r.as_ref().iter().sum()).collect();
    let col_sums: Vec<f64> = (0..ncols)
        .map(|j| rows.iter().map(|r| r.as_ref()[j]).sum())
        .collect();
    if let Some(i) = row_sums.iter().position(|&s| s == 0.0) {
        return Err(CrowdError::degenerate(format!("row {} is all zero", i)));
    }
    if let Some(j) = col_sums.iter().position(|&s| s == 0.0) {
        return Err(CrowdError::degenerate(format!("column {} is all zero", j)));
    }
    let total: f64 = row_sums.iter().sum();

    let expected: Vec<Vec<f64>> = row_sums
        .iter()
        .map(|rs| col_sums.iter().map(|cs| rs * cs / total).collect())
        .collect();

    let dof = (rows.len() - 1) * (ncols - 1);
    if dof == 0 {
        return Ok(ChiSquareResult {
            statistic: 0.0,
            p_value: 1.0,
            dof,
            expected,
        });
    }

    let yates = dof == 1;
    let mut statistic = 0.0;
    for (row, exp_row) in rows.iter().zip(&expected) {
        for (&o, &e) in row.as_ref().iter().zip(exp_row) {
            let observed = if yates {
                let diff = e - o;
                o + diff.abs().min(0.5) * diff.signum()
            } else {
                o
            };
            statistic += (observed - e) * (observed - e) / e;
        }
    }

    let distribution = ChiSquared::new(dof as f64)
        .map_err(|e| CrowdError::degenerate(format!("chi-square distribution: {}", e)))?;
    let p_value = distribution.sf(statistic);

    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        expected,
    })
}

/// p-value of a table, or 0 when the test is undefined.
fn p_value_or_zero<R: AsRef<[f64]>>(rows: &[R], what: &str) -> f64 {
    match chi2_contingency(rows) {
        Ok(result) => result.p_value,
        Err(e) => {
            debug!("[Similarity] {} similarity scored 0: {}", what, e);
            0.0
        }
    }
}

/// Movement similarity of `test` against a reference movement model.
///
/// One row per vector of the test track's vector set:
/// `[share in test, share in reference]`.
pub fn movement_similarity_against(reference: &MovementModel, test: &[Point]) -> f64 {
    let test_model = match MovementModel::from_track(test, reference.resolution()) {
        Ok(model) => model,
        Err(e) => {
            debug!("[Similarity] movement similarity scored 0: {}", e);
            return 0.0;
        }
    };

    let rows: Vec<[f64; 2]> = test_model
        .vector_set()
        .iter()
        .map(|v| [test_model.move_prob(v), reference.move_prob(v)])
        .collect();
    p_value_or_zero(&rows, "movement")
}

/// Movement similarity of two tracks, vectors keyed at `resolution`.
pub fn move_similarity(reference: &[Point], test: &[Point], resolution: f64) -> f64 {
    match MovementModel::from_track(reference, resolution) {
        Ok(model) => movement_similarity_against(&model, test),
        Err(e) => {
            debug!("[Similarity] movement similarity scored 0: {}", e);
            0.0
        }
    }
}

/// Land-use similarity of `test` against the reference table.
///
/// The test track's own table is built with the same `lag` and `spacing`.
/// Rows are aligned by class over the union of both tables:
/// `[share in test, share in reference]`.
pub fn location_similarity<L>(
    test: &[Point],
    table: &LocationTable,
    lookup: &L,
    lag: f64,
    spacing: f64,
) -> f64
where
    L: LandUseLookup + ?Sized,
{
    let test_table = match LocationTable::from_track(test, lookup, lag, spacing) {
        Ok(t) => t,
        Err(e) => {
            debug!("[Similarity] location similarity scored 0: {}", e);
            return 0.0;
        }
    };

    let classes: BTreeSet<&LandUseClass> = test_table.classes().chain(table.classes()).collect();
    let rows: Vec<[f64; 2]> = classes
        .into_iter()
        .map(|c| [test_table.get(c), table.get(c)])
        .collect();
    p_value_or_zero(&rows, "location")
}

/// `move_similarity + location_similarity`.
pub fn combined_similarity<L>(
    reference: &[Point],
    test: &[Point],
    table: &LocationTable,
    lookup: &L,
    lag: f64,
    spacing: f64,
    resolution: f64,
) -> f64
where
    L: LandUseLookup + ?Sized,
{
    move_similarity(reference, test, resolution)
        + location_similarity(test, table, lookup, lag, spacing)
}

/// Reusable similarity scorer against one reference track.
///
/// Holds the reference movement model so repeated scoring during extension
/// does not rebuild it.
pub struct SimilarityTester<'a, L: LandUseLookup + ?Sized> {
    reference: &'a MovementModel,
    table: &'a LocationTable,
    lookup: &'a L,
    lag: f64,
    spacing: f64,
}

impl<'a, L: LandUseLookup + ?Sized> SimilarityTester<'a, L> {
    pub fn new(
        reference: &'a MovementModel,
        table: &'a LocationTable,
        lookup: &'a L,
        lag: f64,
        spacing: f64,
    ) -> Self {
        Self {
            reference,
            table,
            lookup,
            lag,
            spacing,
        }
    }

    pub fn movement(&self, test: &[Point]) -> f64 {
        movement_similarity_against(self.reference, test)
    }

    pub fn location(&self, test: &[Point]) -> f64 {
        location_similarity(test, self.table, self.lookup, self.lag, self.spacing)
    }

    /// Sum of the movement and location p-values.
    pub fn combined(&self, test: &[Point]) -> f64 {
        self.movement(test) + self.location(test)
    }
}
