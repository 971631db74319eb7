//! Filter operations
//!
//! Separable filtering of N-dimensional volumes, one axis at a time.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;
