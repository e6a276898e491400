//! Dense linear-algebra helpers shared by the tests and the ordination helpers.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use nalgebra::{Cholesky, DMatrix, Dyn, RealField};

use crate::{Error, Float};

/// Below this ratio between a Cholesky pivot and the variance it came from, a
/// variable is treated as a linear combination of the preceding ones.
const RELATIVE_PIVOT_TOLERANCE: f64 = 1e-10;

/// Flattens row-major observations into an `n x d` matrix.
///
/// Every row must have the same non-zero length and contain only finite values.
pub(crate) fn collect_rows<T, I, J>(data: I) -> Result<DMatrix<T>, Error>
where
    T: Float + RealField,
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = T>,
{
    let mut flat_data = Vec::new();
    let mut n = 0;
    let mut d = 0;

    for (i, row) in data.into_iter().enumerate() {
        n += 1;
        let mut row_len = 0;

        for val in row {
            if val.is_nan() {
                return Err(Error::ContainsNaN);
            }

            if num_traits::Float::is_infinite(val) {
                return Err(Error::ContainsInfinite);
            }

            flat_data.push(val);
            row_len += 1;
        }

        if i == 0 {
            d = row_len;

            if d == 0 {
                return Err(Error::DimensionMismatch);
            }
        } else if row_len != d {
            return Err(Error::DimensionMismatch);
        }
    }

    Ok(DMatrix::from_row_slice(n, d, &flat_data))
}

/// Rejects matrices holding `NaN` or infinite values.
pub(crate) fn ensure_finite<T: Float + RealField>(x: &DMatrix<T>) -> Result<(), Error> {
    for &val in x.iter() {
        if val.is_nan() {
            return Err(Error::ContainsNaN);
        }

        if num_traits::Float::is_infinite(val) {
            return Err(Error::ContainsInfinite);
        }
    }

    Ok(())
}

/// Groups row indices by label, keeping labels in order of first appearance.
pub(crate) fn partition_rows<L, G>(groups: G, rows: usize) -> Result<IndexMap<L, Vec<usize>>, Error>
where
    L: Eq + Hash + Debug,
    G: IntoIterator<Item = L>,
{
    let mut partition: IndexMap<L, Vec<usize>> = IndexMap::new();
    let mut labels = 0;

    for (i, label) in groups.into_iter().enumerate() {
        partition.entry(label).or_default().push(i);
        labels += 1;
    }

    if labels != rows {
        return Err(Error::GroupLengthMismatch { rows, labels });
    }

    Ok(partition)
}

/// Subtracts the column means from every row.
pub(crate) fn center_columns<T: Float + RealField>(x: &DMatrix<T>) -> DMatrix<T> {
    let mean_vec = x.row_mean();
    let mut x_centered = x.clone();

    for mut row in x_centered.row_iter_mut() {
        row -= &mean_vec;
    }

    x_centered
}

/// Covariance of the columns of `x`, divided by `n` when `population` is set and by
/// `n - 1` (Bessel's correction) otherwise.
pub(crate) fn covariance<T: Float + RealField>(x: &DMatrix<T>, population: bool) -> DMatrix<T> {
    let n = x.nrows();
    let x_centered = center_columns(x);
    let s_raw = x_centered.transpose() * &x_centered;
    let divisor = if population { T::from(n).unwrap() } else { T::from(n - 1).unwrap() };

    s_raw.map(|v| v / divisor)
}

/// Mean of the rows of `x` using frequency weights.
pub(crate) fn weighted_mean<T: Float + RealField>(x: &DMatrix<T>, weights: &[T]) -> Vec<T> {
    let total: T = weights.iter().copied().sum();

    x.column_iter()
        .map(|col| col.iter().zip(weights).map(|(&v, &w)| v * w).sum::<T>() / total)
        .collect()
}

/// Frequency-weighted covariance of the columns of `x` with one degree of freedom
/// removed, matching an unweighted covariance when every weight is one.
pub(crate) fn weighted_covariance<T: Float + RealField>(
    x: &DMatrix<T>,
    weights: &[T],
) -> Result<DMatrix<T>, Error> {
    let total: T = weights.iter().copied().sum();

    if total <= T::one() {
        return Err(Error::InvalidParameter(
            "frequency weights must sum to more than one".into(),
        ));
    }

    let mean = weighted_mean(x, weights);
    let mut x_centered = x.clone();

    for mut row in x_centered.row_iter_mut() {
        for (v, &m) in row.iter_mut().zip(&mean) {
            *v -= m;
        }
    }

    let mut x_weighted = x_centered.clone();

    for (mut row, &w) in x_weighted.row_iter_mut().zip(weights) {
        row *= w;
    }

    let s_raw = x_centered.transpose() * x_weighted;
    let divisor = total - T::one();

    Ok(s_raw.map(|v| v / divisor))
}

/// Cholesky factorization of a covariance matrix that fails on singular and
/// non-positive-definite input instead of yielding `NaN` downstream.
///
/// `what` names the matrix in the error.
pub(crate) fn cholesky<T: Float + RealField>(
    m: DMatrix<T>,
    what: &str,
) -> Result<Cholesky<T, Dyn>, Error> {
    let variances: Vec<f64> = m.diagonal().iter().map(|v| v.to_f64().unwrap()).collect();

    if variances.iter().any(|&v| v.is_nan() || v <= 0.0) {
        return Err(Error::SingularCovariance(what.to_string()));
    }

    let chol = Cholesky::new(m).ok_or_else(|| Error::SingularCovariance(what.to_string()))?;
    let l = chol.l_dirty();

    for (i, &variance) in variances.iter().enumerate() {
        let pivot = l[(i, i)].to_f64().unwrap();

        if pivot * pivot / variance <= RELATIVE_PIVOT_TOLERANCE {
            return Err(Error::SingularCovariance(what.to_string()));
        }
    }

    Ok(chol)
}

/// Natural log of the determinant of the factorized matrix.
pub(crate) fn log_determinant<T: Float + RealField>(chol: &Cholesky<T, Dyn>) -> f64 {
    let log_pivots: f64 = chol.l_dirty().diagonal().iter().map(|v| v.to_f64().unwrap().ln()).sum();

    2.0 * log_pivots
}
