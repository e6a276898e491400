use thiserror::Error as ThisError;

/// Represents errors that can occur while computing a test or an ordination helper.
#[derive(Debug, ThisError, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The input sample size is too small for the computation.
    #[error("Sample size must be at least {needed}, but was given {given}.")]
    InsufficientSampleSize { given: usize, needed: usize },

    /// The data has fewer variables (columns) than the computation needs.
    #[error("Number of variables must be at least {needed}, but was given {given}.")]
    InsufficientDimensions { given: usize, needed: usize },

    /// Rows of the data do not all have the same, non-zero, length, or a matrix
    /// argument does not have the shape the computation expects.
    #[error("Input dimensions do not match.")]
    DimensionMismatch,

    /// The input data contains `NaN` values.
    #[error("Input data must not contain NaN values.")]
    ContainsNaN,

    /// The input data contains infinite values.
    #[error("Input data must not contain infinite values.")]
    ContainsInfinite,

    /// The number of group labels differs from the number of observations.
    #[error("Expected one group label per observation ({rows}), but was given {labels}.")]
    GroupLengthMismatch { rows: usize, labels: usize },

    /// Fewer distinct groups than the test requires.
    #[error("Number of groups must be at least {needed}, but was given {given}.")]
    TooFewGroups { given: usize, needed: usize },

    /// A covariance matrix is singular or not positive definite, so its inverse or
    /// log-determinant does not exist. Holds a description of the offending matrix.
    #[error("The covariance matrix of {0} is singular or not positive definite.")]
    SingularCovariance(String),

    /// The small-sample correction of Mardia's skewness has a zero denominator.
    #[error("The small-sample skewness correction is undefined for this sample size.")]
    DegenerateCorrection,

    /// An argument other than the data is out of its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// See [`statrs::distribution::NormalError`].
    #[error("{0}")]
    NormalDistributionError(#[from] statrs::distribution::NormalError),

    /// See [`statrs::distribution::GammaError`].
    #[error("{0}")]
    GammaError(#[from] statrs::distribution::GammaError),
}
