use nalgebra::{DMatrix, RealField};

use crate::matrix::{ensure_finite, weighted_covariance, weighted_mean};
use crate::{Error, Float};

/// Computes weighted-averages scores, typically species scores from site scores.
///
/// Row `j` of the result is the average of the rows of `scores` (`n` sites by `k` axes), weighted
/// by column `j` of `weights` (`n` sites by `m` species, e.g. abundances). The result has `m`
/// rows and `k` columns.
///
/// If `expand` is `true`, every axis of the result is rescaled around its weighted centroid so
/// that its weighted variance matches the weighted variance of the site scores on that axis,
/// using site totals and species totals as frequency weights.
///
/// Weights must be non-negative and every species (column of `weights`) must have a positive
/// total.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use ordistats::ordination::wascores;
///
/// let sites = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, -1.0, 2.0, 0.0, -2.0]);
/// let abundances = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 3.0, 0.0, 1.0]);
///
/// let species = wascores(&sites, &abundances, false).unwrap();
/// assert_eq!(species.shape(), (2, 2));
/// assert_eq!(species[(0, 1)], 1.0);
/// ```
pub fn wascores<T: Float + RealField>(
    scores: &DMatrix<T>,
    weights: &DMatrix<T>,
    expand: bool,
) -> Result<DMatrix<T>, Error> {
    if scores.nrows() != weights.nrows() || scores.ncols() == 0 || weights.ncols() == 0 {
        return Err(Error::DimensionMismatch);
    }

    if scores.nrows() == 0 {
        return Err(Error::InsufficientSampleSize {
            given: 0,
            needed: 1,
        });
    }

    ensure_finite(scores)?;
    ensure_finite(weights)?;

    if weights.iter().any(|&w| w < T::zero()) {
        return Err(Error::InvalidParameter("weights must be non-negative".into()));
    }

    let species_totals: Vec<T> =
        weights.column_iter().map(|col| col.iter().copied().sum()).collect();

    if let Some(j) = species_totals.iter().position(|&total| total <= T::zero()) {
        return Err(Error::InvalidParameter(format!("weights of column {j} sum to zero")));
    }

    let mut wa = weights.transpose() * scores;

    for (mut row, &total) in wa.row_iter_mut().zip(&species_totals) {
        row /= total;
    }

    if !expand {
        return Ok(wa);
    }

    let site_totals: Vec<T> = weights.row_iter().map(|row| row.iter().copied().sum()).collect();
    let site_cov = weighted_covariance(scores, &site_totals)?;
    let wa_cov = weighted_covariance(&wa, &species_totals)?;
    let centroid = weighted_mean(&wa, &species_totals);

    for (axis, (mut col, &center)) in wa.column_iter_mut().zip(&centroid).enumerate() {
        let wa_var = wa_cov[(axis, axis)].to_f64().unwrap();

        if wa_var <= 0.0 {
            return Err(Error::SingularCovariance(format!(
                "weighted-average scores on axis {axis}"
            )));
        }

        let site_var = site_cov[(axis, axis)].to_f64().unwrap();
        let multiplier = T::from((site_var / wa_var).sqrt()).unwrap();

        for v in col.iter_mut() {
            *v = (*v - center) * multiplier + center;
        }
    }

    Ok(wa)
}
