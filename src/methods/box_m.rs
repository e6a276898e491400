use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use nalgebra::{DMatrix, RealField};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::factorial::binomial;

use crate::matrix::{cholesky, collect_rows, covariance, log_determinant, partition_rows};
use crate::{Computation, Error, Float};

/// Holds the results of Box's M test together with the covariance matrices it was built from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoxMComputation<T: Float + RealField, L: Eq + Hash> {
    /// The chi-squared approximation of Box's M statistic and its upper-tail p-value.
    pub chi_squared: Computation<T>,

    /// Degrees of freedom of the chi-squared approximation, `(p(p-1)/2 + p)(k-1)`.
    pub degrees_of_freedom: T,

    /// Sample covariance (n - 1 divisor) of each group, in order of first appearance.
    pub covariances: IndexMap<L, DMatrix<T>>,

    /// Degrees-of-freedom weighted average of the group covariances.
    pub pooled_covariance: DMatrix<T>,

    /// Natural log of the determinant of each group covariance, in the order of `covariances`.
    pub log_determinants: Vec<T>,
}

/// Performs Box's M test for the homogeneity of covariance matrices across groups.
///
/// The null hypothesis is that every group was drawn from populations sharing the same
/// covariance matrix. The statistic compares the log-determinant of the pooled covariance with
/// the log-determinants of the group covariances and is referred to a chi-squared distribution
/// after Box's correction.
///
/// Takes an argument `data` which is an iterator of iterators representing the dataset (rows are
/// observations), and `groups`, one label per observation. Groups are processed in the order in
/// which their label first appears.
///
/// At least two groups are required, each with at least two observations. A group with fewer
/// than `p + 1` observations is reported through a `tracing` warning; its covariance is then
/// singular and the test fails with [`Error::SingularCovariance`].
///
/// # Examples
///
/// ```
/// use ordistats::box_m_test;
///
/// let data = vec![
///     vec![5.1, 3.5],
///     vec![4.9, 3.0],
///     vec![4.7, 3.2],
///     vec![5.0, 3.6],
///     vec![7.0, 3.2],
///     vec![6.4, 3.2],
///     vec![6.9, 3.1],
///     vec![5.5, 2.3],
/// ];
/// let groups = ["a", "a", "a", "a", "b", "b", "b", "b"];
///
/// let result = box_m_test(data, groups).unwrap();
/// assert_eq!(result.degrees_of_freedom, 3.0);
/// assert!(result.chi_squared.p_value > 0.05);
/// ```
pub fn box_m_test<T, L, I, J, G>(data: I, groups: G) -> Result<BoxMComputation<T, L>, Error>
where
    T: Float + RealField,
    L: Eq + Hash + Debug,
    I: IntoIterator<Item = J>,
    J: IntoIterator<Item = T>,
    G: IntoIterator<Item = L>,
{
    let x_mat = collect_rows(data)?;
    let p = x_mat.ncols();
    let partition = partition_rows(groups, x_mat.nrows())?;
    let k = partition.len();

    if k < 2 {
        return Err(Error::TooFewGroups {
            given: k,
            needed: 2,
        });
    }

    for (label, rows) in &partition {
        if rows.len() < 2 {
            return Err(Error::InsufficientSampleSize {
                given: rows.len(),
                needed: 2,
            });
        }

        let dof = rows.len() - 1;

        if dof < p {
            tracing::warn!(
                group = ?label,
                degrees_of_freedom = dof,
                variables = p,
                "group has fewer observations than variables, its covariance matrix is singular"
            );
        }
    }

    let mut covariances = IndexMap::with_capacity(k);
    let mut log_determinants = Vec::with_capacity(k);
    let mut degrees_of_freedom = Vec::with_capacity(k);
    let mut pooled = DMatrix::<T>::zeros(p, p);

    for (label, rows) in partition {
        let dof = rows.len() - 1;
        let group_cov = covariance(&x_mat.select_rows(rows.iter()), false);
        let chol = cholesky(group_cov.clone(), &format!("group {label:?}"))?;

        pooled += group_cov.map(|v| v * T::from(dof).unwrap());
        log_determinants.push(log_determinant(&chol));
        degrees_of_freedom.push(dof as f64);
        covariances.insert(label, group_cov);
    }

    let total_dof: f64 = degrees_of_freedom.iter().sum();
    let total_inv_dof: f64 = degrees_of_freedom.iter().map(|dof| 1.0 / dof).sum();
    let pooled = pooled.map(|v| v / T::from(total_dof).unwrap());
    let pooled_log_det = log_determinant(&cholesky(pooled.clone(), "pooled groups")?);

    let weighted_log_dets: f64 =
        log_determinants.iter().zip(&degrees_of_freedom).map(|(log_det, dof)| log_det * dof).sum();
    let box_log = total_dof * pooled_log_det - weighted_log_dets;

    let p_f64 = p as f64;
    let k_f64 = k as f64;
    let correction = (2.0 * p_f64 * p_f64 + 3.0 * p_f64 - 1.0)
        / (6.0 * (p_f64 + 1.0) * (k_f64 - 1.0))
        * (total_inv_dof - 1.0 / total_dof);
    let chi_squared = box_log * (1.0 - correction);
    let dof_chi_squared = (binomial(p as u64, 2) + p_f64) * (k_f64 - 1.0);

    let p_value = ChiSquared::new(dof_chi_squared)?.sf(chi_squared);

    tracing::debug!(chi_squared, dof_chi_squared, p_value, groups = k, "computed Box's M test");

    Ok(BoxMComputation {
        chi_squared: Computation {
            statistic: T::from(chi_squared).unwrap(),
            p_value: T::from(p_value).unwrap(),
        },
        degrees_of_freedom: T::from(dof_chi_squared).unwrap(),
        covariances,
        pooled_covariance: pooled,
        log_determinants: log_determinants.into_iter().map(|v| T::from(v).unwrap()).collect(),
    })
}
