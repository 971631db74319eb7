use crate::error::FilterError;
use crate::Real;

use super::LineFilter;

/// Second-difference stencil.
const SECOND_DIFFERENCE: [f64; 3] = [1.0, -2.0, 1.0];

/// Central difference stencil.
const CENTRAL_DIFFERENCE: [f64; 3] = [0.5, 0.0, -0.5];

fn full_convolution(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Create a finite difference derivative kernel.
///
/// The kernel applies the second difference `order / 2` times and the central
/// difference `order % 2` times, giving a width of `2 * ((order + 1) / 2) + 1`.
/// Coefficients are laid out for convolution, so the first entry weights the
/// sample *after* the center.
///
/// # Arguments
///
/// * `order` - The derivative order. Order 0 gives the identity `[1]`.
///
/// # Returns
///
/// A vector of the kernel.
pub fn derivative_operator(order: u32) -> Vec<f64> {
    let mut kernel = vec![1.0];
    for _ in 0..order / 2 {
        kernel = full_convolution(&kernel, &SECOND_DIFFERENCE);
    }
    if order % 2 == 1 {
        kernel = full_convolution(&kernel, &CENTRAL_DIFFERENCE);
    }
    kernel
}

/// Finite impulse response line filter.
///
/// Samples outside the line repeat the nearest edge sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionKernel<R> {
    coefficients: Vec<R>,
    radius: usize,
}

impl<R: Real> ConvolutionKernel<R> {
    /// Create a kernel from `f64` coefficients.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidKernelLength`] unless the length is odd.
    pub fn new(coefficients: &[f64]) -> Result<Self, FilterError> {
        if coefficients.len() % 2 == 0 {
            return Err(FilterError::InvalidKernelLength(coefficients.len()));
        }

        Ok(Self {
            coefficients: coefficients.iter().map(|&c| R::from_real(c)).collect(),
            radius: coefficients.len() / 2,
        })
    }

    /// The kernel coefficients.
    pub fn coefficients(&self) -> &[R] {
        &self.coefficients
    }

    /// The number of samples on each side of the center.
    pub fn radius(&self) -> usize {
        self.radius
    }
}

impl<R: Real> LineFilter<R> for ConvolutionKernel<R> {
    fn filter_line(&self, output: &mut [R], input: &[R]) {
        let Some(last) = input.len().checked_sub(1) else {
            return;
        };

        for (i, out) in output.iter_mut().enumerate() {
            let mut acc = R::zero();
            for (j, &c) in self.coefficients.iter().enumerate() {
                let pos = (i + self.radius).saturating_sub(j).min(last);
                acc = acc + c * input[pos];
            }
            *out = acc;
        }
    }
}
