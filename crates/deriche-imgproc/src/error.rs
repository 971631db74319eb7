use deriche_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the filtering operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// Error raised by the volume container.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error raised while fanning work out to threads.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),

    /// The filter was executed before an input volume was set.
    #[error("No input volume has been set")]
    MissingInput,

    /// The filtering direction does not exist for the input volume.
    #[error("Direction {direction} out of range for a volume of dimension {dimension}")]
    InvalidDirection {
        /// Requested direction.
        direction: usize,
        /// Number of axes of the volume.
        dimension: usize,
    },

    /// The standard deviation must be finite and strictly positive.
    #[error("Sigma must be finite and > 0, got {0}")]
    InvalidSigma(f64),

    /// The variance must be finite and non-negative.
    #[error("Variance must be finite and >= 0, got {0}")]
    InvalidVariance(f64),

    /// The pixel spacing must be finite and strictly positive.
    #[error("Spacing must be finite and > 0, got {0}")]
    InvalidSpacing(f64),

    /// The maximum truncation error must lie in the open interval (0, 1).
    #[error("Maximum error must be in (0, 1), got {0}")]
    InvalidMaximumError(f64),

    /// The maximum kernel width must be at least one.
    #[error("Maximum kernel width must be >= 1, got {0}")]
    InvalidKernelWidth(usize),

    /// A convolution kernel must have an odd, non-zero number of coefficients.
    #[error("Convolution kernel must have an odd, non-zero length, got {0}")]
    InvalidKernelLength(usize),

    /// The generic modified Bessel evaluator only handles orders >= 2.
    #[error("Modified Bessel function I_n requires n >= 2, got {0}; use bessel_i0 or bessel_i1")]
    BesselOrder(u32),
}
