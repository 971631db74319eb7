//! Recursive (IIR) filter coefficient families.
//!
//! A kernel family turns its continuous parameters and the pixel spacing of
//! the filtered axis into a [`RecursiveCoefficients`] set: a fourth order
//! causal recurrence, its anti-causal mirror and the normalization `K`.

mod coefficients;
pub use coefficients::*;

mod gaussian;
pub use gaussian::*;

use std::fmt::Debug;

use crate::error::FilterError;

/// A family of recursive filters.
///
/// Implementors compute the causal numerator and the shared denominator of
/// their response and hand them to [`RecursiveCoefficients::from_causal`],
/// which derives the anti-causal half for the kernel's [`Symmetry`].
pub trait RecursiveKernel: Clone + PartialEq + Debug + Send + Sync {
    /// Whether the response is even or odd about the origin.
    fn symmetry(&self) -> Symmetry;

    /// Compute the coefficient set for an axis with the given `spacing`.
    ///
    /// # Errors
    ///
    /// If the kernel parameters or the spacing are invalid.
    fn set_up(&self, spacing: f64) -> Result<RecursiveCoefficients<f64>, FilterError>;
}
