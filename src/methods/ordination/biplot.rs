use nalgebra::{DMatrix, RealField};

use crate::matrix::ensure_finite;
use crate::{Error, Float};

/// Share of the farthest score that the longest triplot arrow reaches.
const ARROW_REACH: f64 = 0.666;

/// Specifies how scores and loadings are scaled for a biplot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BiplotScaling {
    /// Scaling 1: distances between objects approximate their Euclidean distances.
    /// Scores and loadings are used as given.
    Distance,

    /// Scaling 2: angles between loading vectors reflect correlations. Scores are divided and
    /// loadings multiplied by the square roots of the eigenvalues.
    Correlation,
}

/// Scores and loadings ready to be drawn on the same axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BiplotCoordinates<T: Float + RealField> {
    /// Object scores, one row per object.
    pub scores: DMatrix<T>,

    /// Variable loadings, one row per variable.
    pub loadings: DMatrix<T>,
}

/// Scales ordination scores and loadings for a biplot.
///
/// `scores` is `n` objects by `k` axes, `loadings` is `p` variables by `k` axes and
/// `eigenvalues` holds the `k` eigenvalues of the axes. Eigenvalues are only used, and must
/// then be positive, for [`Correlation`](BiplotScaling::Correlation) scaling.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use ordistats::ordination::{BiplotScaling, biplot_coordinates};
///
/// let scores = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, -2.0, -1.0]);
/// let loadings = DMatrix::from_row_slice(2, 2, &[0.6, 0.8, 0.8, -0.6]);
///
/// let biplot =
///     biplot_coordinates(&scores, &loadings, &[4.0, 1.0], BiplotScaling::Correlation).unwrap();
/// assert_eq!(biplot.scores[(0, 0)], 1.0);
/// assert_eq!(biplot.loadings[(0, 0)], 1.2);
/// ```
pub fn biplot_coordinates<T: Float + RealField>(
    scores: &DMatrix<T>,
    loadings: &DMatrix<T>,
    eigenvalues: &[T],
    scaling: BiplotScaling,
) -> Result<BiplotCoordinates<T>, Error> {
    if scores.ncols() != loadings.ncols() {
        return Err(Error::DimensionMismatch);
    }

    ensure_finite(scores)?;
    ensure_finite(loadings)?;

    match scaling {
        BiplotScaling::Distance => Ok(BiplotCoordinates {
            scores: scores.clone(),
            loadings: loadings.clone(),
        }),
        BiplotScaling::Correlation => {
            if eigenvalues.len() != scores.ncols() {
                return Err(Error::DimensionMismatch);
            }

            let roots = eigenvalues
                .iter()
                .map(|&lambda| {
                    let lambda = lambda.to_f64().unwrap();

                    if lambda > 0.0 && lambda.is_finite() {
                        Ok(lambda.sqrt())
                    } else {
                        Err(Error::InvalidParameter(format!(
                            "eigenvalues must be positive for correlation scaling, got {lambda}"
                        )))
                    }
                })
                .collect::<Result<Vec<f64>, Error>>()?;

            let mut scaled_scores = scores.clone();
            let mut scaled_loadings = loadings.clone();

            for (axis, &root) in roots.iter().enumerate() {
                let root = T::from(root).unwrap();

                scaled_scores.column_mut(axis).apply(|v| *v /= root);
                scaled_loadings.column_mut(axis).apply(|v| *v *= root);
            }

            Ok(BiplotCoordinates {
                scores: scaled_scores,
                loadings: scaled_loadings,
            })
        },
    }
}

/// Computes the factor by which loading arrows are stretched on a triplot.
///
/// The longest arrow, measured on the two `axes`, is scaled to reach two thirds of the largest
/// absolute site or species coordinate on those axes.
pub fn triplot_arrow_scale<T: Float + RealField>(
    site_scores: &DMatrix<T>,
    species_scores: &DMatrix<T>,
    loadings: &DMatrix<T>,
    axes: (usize, usize),
) -> Result<T, Error> {
    let (x, y) = axes;

    for m in [site_scores, species_scores, loadings] {
        if x >= m.ncols() || y >= m.ncols() {
            return Err(Error::DimensionMismatch);
        }

        ensure_finite(m)?;
    }

    let farthest = [site_scores, species_scores]
        .into_iter()
        .flat_map(|m| m.column(x).iter().chain(m.column(y).iter()).copied().collect::<Vec<_>>())
        .map(|v| v.to_f64().unwrap().abs())
        .fold(0.0, f64::max);

    let longest_arrow = loadings
        .row_iter()
        .map(|row| row[x].to_f64().unwrap().hypot(row[y].to_f64().unwrap()))
        .fold(0.0, f64::max);

    if longest_arrow <= 0.0 {
        return Err(Error::InvalidParameter("all loadings are zero on the selected axes".into()));
    }

    Ok(T::from(farthest * ARROW_REACH / longest_arrow).unwrap())
}
