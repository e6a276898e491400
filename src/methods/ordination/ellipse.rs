use std::f64::consts::PI;
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use nalgebra::{DMatrix, RealField};

use crate::matrix::{cholesky, covariance, ensure_finite, partition_rows};
use crate::{Error, Float};

/// Specifies what a confidence ellipse surrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EllipseMethod {
    /// The region expected to hold the given proportion of the observations.
    Deviation,

    /// The confidence region of the mean, i.e. the deviation ellipse shrunk by `sqrt(n)`.
    StandardError,
}

/// The centroid and both confidence ellipses of one group of ordination scores.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GroupEllipse<T: Float> {
    /// Mean of the group on the two axes.
    pub center: [T; 2],

    /// Boundary of the [`Deviation`](EllipseMethod::Deviation) ellipse.
    pub deviation: Vec<[T; 2]>,

    /// Boundary of the [`StandardError`](EllipseMethod::StandardError) ellipse.
    pub standard_error: Vec<[T; 2]>,
}

/// Computes the boundary of a confidence ellipse around two-dimensional points.
///
/// The ellipse is centered on the mean of `points` (an `n x 2` matrix) and shaped by their
/// sample covariance. Its radius is `sqrt(2 F(level; 2, n - 1))`, where `F` is the quantile
/// function of the F distribution, divided by `sqrt(n)` for
/// [`StandardError`](EllipseMethod::StandardError).
///
/// Returns `npoints + 1` points; the last one repeats the first so the curve is closed.
///
/// # Examples
///
/// ```
/// use nalgebra::DMatrix;
/// use ordistats::ordination::{EllipseMethod, ellipse};
///
/// let points = DMatrix::from_row_slice(5, 2, &[1.0, 2.0, 2.0, 3.5, 3.0, 3.9, 4.0, 6.1, 5.0, 6.8]);
/// let boundary = ellipse(&points, 0.95, EllipseMethod::Deviation, 100).unwrap();
///
/// assert_eq!(boundary.len(), 101);
/// assert_eq!(boundary.first(), boundary.last());
/// ```
pub fn ellipse<T: Float + RealField>(
    points: &DMatrix<T>,
    level: f64,
    method: EllipseMethod,
    npoints: usize,
) -> Result<Vec<[T; 2]>, Error> {
    if points.ncols() != 2 {
        return Err(Error::DimensionMismatch);
    }

    let n = points.nrows();

    if n < 3 {
        return Err(Error::InsufficientSampleSize {
            given: n,
            needed: 3,
        });
    }

    if !(level > 0.0 && level < 1.0) {
        return Err(Error::InvalidParameter(format!("level must lie in (0, 1), got {level}")));
    }

    if npoints == 0 {
        return Err(Error::InvalidParameter("npoints must be at least 1".into()));
    }

    ensure_finite(points)?;

    let chol = cholesky(covariance(points, false), "ellipse points")?;
    let l = chol.l().map(|v| v.to_f64().unwrap());
    let center: Vec<f64> = points.row_mean().iter().map(|v| v.to_f64().unwrap()).collect();

    let n_f64 = n as f64;
    let deviation_radius = (2.0 * f_quantile_two(level, n_f64 - 1.0)).sqrt();
    let radius = match method {
        EllipseMethod::Deviation => deviation_radius,
        EllipseMethod::StandardError => deviation_radius / n_f64.sqrt(),
    };

    let boundary = (0..=npoints)
        .map(|i| {
            // Close the curve exactly rather than through cos(2 pi).
            let angle = if i == npoints { 0.0 } else { i as f64 * 2.0 * PI / npoints as f64 };
            let (sin, cos) = angle.sin_cos();
            let x = center[0] + radius * l[(0, 0)] * cos;
            let y = center[1] + radius * (l[(1, 0)] * cos + l[(1, 1)] * sin);

            [T::from(x).unwrap(), T::from(y).unwrap()]
        })
        .collect();

    Ok(boundary)
}

/// Computes the centroid, deviation ellipse and standard-error ellipse of every group of scores.
///
/// `axes` selects the two columns of `scores` to use. Groups are returned in order of first
/// appearance; every group needs at least three observations.
pub fn group_ellipses<T, L, G>(
    scores: &DMatrix<T>,
    groups: G,
    axes: (usize, usize),
    level: f64,
    npoints: usize,
) -> Result<IndexMap<L, GroupEllipse<T>>, Error>
where
    T: Float + RealField,
    L: Eq + Hash + Debug,
    G: IntoIterator<Item = L>,
{
    if axes.0 >= scores.ncols() || axes.1 >= scores.ncols() {
        return Err(Error::DimensionMismatch);
    }

    let plane = scores.select_columns([axes.0, axes.1].iter());
    let partition = partition_rows(groups, scores.nrows())?;

    partition
        .into_iter()
        .map(|(label, rows)| {
            let group = plane.select_rows(rows.iter());
            let mean = group.row_mean();

            let ellipses = GroupEllipse {
                center: [mean[0], mean[1]],
                deviation: ellipse(&group, level, EllipseMethod::Deviation, npoints)?,
                standard_error: ellipse(&group, level, EllipseMethod::StandardError, npoints)?,
            };

            Ok((label, ellipses))
        })
        .collect()
}

/// Quantile of the F distribution with 2 numerator degrees of freedom, whose CDF
/// `1 - (1 + 2x/d)^(-d/2)` inverts in closed form.
fn f_quantile_two(q: f64, d: f64) -> f64 {
    d / 2.0 * ((1.0 - q).powf(-2.0 / d) - 1.0)
}
