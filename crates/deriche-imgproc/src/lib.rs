#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! The crate implements Deriche's recursive (IIR) approximation of the
//! Gaussian and its first two derivatives, applied separably along the axes
//! of a [`deriche_image::Volume`], together with the sampled discrete
//! Gaussian (FIR) operator it is usually compared against.
//!
//! ```rust
//! use deriche_image::Volume;
//! use deriche_imgproc::filter::RecursiveSeparableFilter;
//! use deriche_imgproc::recursive::RecursiveGaussian;
//!
//! let volume = Volume::<f32, 2>::from_shape_val([10, 10], 7.0);
//!
//! let mut filter = RecursiveSeparableFilter::new(RecursiveGaussian::new(2.0));
//! filter.set_input_image(&volume);
//! filter.set_direction(1);
//! let smoothed = filter.generate_data().unwrap();
//!
//! assert!(smoothed.as_slice().iter().all(|v| (v - 7.0).abs() < 1e-4));
//! ```

/// Error types for the filtering module.
pub mod error;

/// Separable filtering of volumes: line filters, drivers and convenience operations.
pub mod filter;

/// Sampled Gaussian and Gaussian derivative operator coefficients.
pub mod operator;

/// module containing parallization utilities.
pub mod parallel;

/// Recursive (IIR) coefficient families.
pub mod recursive;

/// Modified Bessel functions of the first kind.
pub mod special;

/// Compensated floating point summation.
pub mod summation;

pub use crate::error::FilterError;

use deriche_image::PixelCast;
use num_traits::Float;

/// Floating point type used for intermediate computations.
///
/// The computation precision is independent of the pixel storage type: an
/// `u8` volume can be filtered in `f64`, and an `f64` volume in `f32`.
pub trait Real: Float + PixelCast + std::fmt::Debug + Send + Sync + 'static {}

impl<R> Real for R where R: Float + PixelCast + std::fmt::Debug + Send + Sync + 'static {}
