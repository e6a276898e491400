use nalgebra::{DMatrix, RealField};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::matrix::{center_columns, cholesky, collect_rows, covariance};
use crate::{Computation, Error, Float};

/// Holds the results of Mardia's multivariate skewness and kurtosis tests.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MardiaComputation<T: Float> {
    /// Mardia's multivariate skewness, `b1,p`.
    pub g1p: T,

    /// The skewness statistic `n * g1p / 6` and its chi-squared p-value.
    pub skewness: Computation<T>,

    /// The skewness statistic with the small-sample correction factor applied, and its
    /// chi-squared p-value.
    pub small_sample_skewness: Computation<T>,

    /// Mardia's multivariate kurtosis, `b2,p`.
    pub g2p: T,

    /// The standardized kurtosis Z-statistic and its two-sided normal p-value.
    pub kurtosis: Computation<T>,

    /// Degrees of freedom of the skewness chi-squared distribution, `p(p+1)(p+2)/6`.
    pub degrees_of_freedom: T,
}

/// Performs Mardia's skewness and kurtosis tests to assess multivariate normality.
///
/// This function builds the matrix of Mahalanobis products between every pair of centered
/// observations and derives multivariate skewness and kurtosis from it. Both the plain and the
/// small-sample corrected skewness statistics are reported.
///
/// Takes an argument `data` which is an iterator of iterators representing the dataset (rows are
/// observations). At least two variables are required.
///
/// Also takes `use_population_covariance`, which, if `true`, uses the population covariance
/// estimator (n divisor); otherwise uses sample covariance (n-1 divisor).
///
/// Fails with [`Error::SingularCovariance`] when the covariance matrix cannot be inverted.
///
/// # Examples
///
/// ```
/// use ordistats::mardia;
///
/// // 3D data
/// let data = vec![
///     vec![2.3, 4.1, 0.5],
///     vec![1.9, 3.8, 0.7],
///     vec![2.8, 4.6, 0.2],
///     vec![3.1, 5.2, 0.9],
///     vec![2.0, 3.5, 1.4],
///     vec![2.6, 4.4, 0.3],
///     vec![3.4, 5.0, 1.1],
///     vec![1.7, 3.3, 0.8],
/// ];
///
/// let result = mardia(data, true).unwrap();
/// assert_eq!(result.degrees_of_freedom, 10.0);
/// assert!(result.skewness.p_value > 0.05);
/// assert!(result.kurtosis.p_value > 0.05);
/// ```
pub fn mardia<T: Float + RealField, I: IntoIterator<Item = J>, J: IntoIterator<Item = T>>(
    data: I,
    use_population_covariance: bool,
) -> Result<MardiaComputation<T>, Error> {
    let x_mat = collect_rows(data)?;
    let n = x_mat.nrows();
    let p = x_mat.ncols();

    if p < 2 {
        return Err(Error::InsufficientDimensions {
            given: p,
            needed: 2,
        });
    }

    if n < 2 {
        return Err(Error::InsufficientSampleSize {
            given: n,
            needed: 2,
        });
    }

    let k_const = small_sample_correction(n, p)?;
    let (g1p, g2p) = calculate_mardia_moments(&x_mat, use_population_covariance)?;

    let n_f64 = n as f64;
    let p_f64 = p as f64;
    let df_skew = p_f64 * (p_f64 + 1.0) * (p_f64 + 2.0) / 6.0;

    let skew_stat = n_f64 * g1p / 6.0;
    let small_skew_stat = n_f64 * k_const * g1p / 6.0;
    let expected_kurt = p_f64 * (p_f64 + 2.0);
    let kurt_stat = (g2p - expected_kurt) * (n_f64 / (8.0 * expected_kurt)).sqrt();

    let dist_skew = ChiSquared::new(df_skew)?;
    let p_skew = dist_skew.sf(skew_stat); // Upper tail
    let p_small_skew = dist_skew.sf(small_skew_stat);
    let dist_kurt = Normal::new(0.0, 1.0)?;
    let p_kurt = 2.0 * dist_kurt.sf(kurt_stat.abs());

    tracing::debug!(g1p, g2p, skew_stat, kurt_stat, p_skew, p_kurt, "computed Mardia's test");

    Ok(MardiaComputation {
        g1p: T::from(g1p).unwrap(),
        skewness: Computation {
            statistic: T::from(skew_stat).unwrap(),
            p_value: T::from(p_skew).unwrap(),
        },
        small_sample_skewness: Computation {
            statistic: T::from(small_skew_stat).unwrap(),
            p_value: T::from(p_small_skew).unwrap(),
        },
        g2p: T::from(g2p).unwrap(),
        kurtosis: Computation {
            statistic: T::from(kurt_stat).unwrap(),
            p_value: T::from(p_kurt).unwrap(),
        },
        degrees_of_freedom: T::from(df_skew).unwrap(),
    })
}

/// Small-sample correction factor of the skewness statistic,
/// `(p+1)(n+1)(n+3) / (n((n+1)(p+1) - 6))`.
fn small_sample_correction(n: usize, p: usize) -> Result<f64, Error> {
    if (n + 1) * (p + 1) == 6 {
        return Err(Error::DegenerateCorrection);
    }

    let n_f64 = n as f64;
    let p_f64 = p as f64;

    Ok(((p_f64 + 1.0) * (n_f64 + 1.0) * (n_f64 + 3.0))
        / (n_f64 * ((n_f64 + 1.0) * (p_f64 + 1.0) - 6.0)))
}

/// Returns Mardia's multivariate skewness and kurtosis, `(g1p, g2p)`.
fn calculate_mardia_moments<T: Float + RealField>(
    x_mat: &DMatrix<T>,
    use_population_covariance: bool,
) -> Result<(f64, f64), Error> {
    let n_f64 = x_mat.nrows() as f64;
    let x_centered = center_columns(x_mat);
    let s_mat = covariance(x_mat, use_population_covariance);
    let s_inv = cholesky(s_mat, "sample")?.inverse();

    let d_mat = &x_centered * &s_inv * x_centered.transpose();

    let sum_d_cubed: f64 = iter_if_parallel!(0..d_mat.nrows())
        .map(|i| d_mat.row(i).iter().map(|&v| v.to_f64().unwrap().powi(3)).sum::<f64>())
        .sum();
    let g1p = sum_d_cubed / (n_f64 * n_f64);
    let sum_diag_sq: f64 = d_mat.diagonal().iter().map(|&v| v.to_f64().unwrap().powi(2)).sum();
    let g2p = sum_diag_sq / n_f64;

    Ok((g1p, g2p))
}
