#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! A [`Volume`] is a row-major N-dimensional buffer that carries the physical
//! spacing of each axis. Filters consume it one 1-D line at a time through
//! [`Volume::read_line`] and [`Volume::write_line`].
//!
//! ```rust
//! use deriche_image::Volume;
//!
//! let volume = Volume::<f32, 2>::from_shape_fn([2, 3], |[r, c]| (r * 3 + c) as f32)
//!     .with_spacing([2.0, 0.5])
//!     .unwrap();
//!
//! let mut column = vec![0.0; 2];
//! volume.read_line(0, 1, &mut column).unwrap();
//! assert_eq!(column, vec![1.0, 4.0]);
//! ```

/// Error types for the volume module.
pub mod error;

/// Pixel conversion between storage and computation types.
pub mod pixel;

/// N-dimensional volume representation.
pub mod volume;

pub use crate::error::ImageError;
pub use crate::pixel::PixelCast;
pub use crate::volume::{get_strides_from_shape, Volume};

/// Type alias for a 2-dimensional volume (an image).
pub type Volume2<T> = Volume<T, 2>;

/// Type alias for a 3-dimensional volume.
pub type Volume3<T> = Volume<T, 3>;
