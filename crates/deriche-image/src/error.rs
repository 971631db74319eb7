/// An error type for the volume module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// The data length does not match the product of the extents.
    #[error("Data length ({actual}) does not match the volume shape ({expected} elements)")]
    InvalidShape {
        /// Number of elements implied by the shape.
        expected: usize,
        /// Number of elements provided.
        actual: usize,
    },

    /// A spacing component is not a finite positive number.
    #[error("Spacing along axis {axis} must be finite and > 0, got {value}")]
    InvalidSpacing {
        /// Offending axis.
        axis: usize,
        /// Offending spacing value.
        value: f64,
    },

    /// The axis does not exist for this volume.
    #[error("Axis {axis} out of bounds for a volume of dimension {dimension}")]
    AxisOutOfBounds {
        /// Requested axis.
        axis: usize,
        /// Number of axes of the volume.
        dimension: usize,
    },

    /// The line index exceeds the number of lines along the axis.
    #[error("Line {line} out of bounds, axis has {num_lines} lines")]
    LineOutOfBounds {
        /// Requested line.
        line: usize,
        /// Number of lines along the axis.
        num_lines: usize,
    },

    /// The line buffer length does not match the extent of the axis.
    #[error("Line buffer has length {actual} but axis extent is {expected}")]
    LineLengthMismatch {
        /// Extent of the axis.
        expected: usize,
        /// Length of the provided buffer.
        actual: usize,
    },

    /// A pixel value could not be represented in the target type.
    #[error("Pixel value {0} cannot be cast to the target type")]
    CastError(f64),
}
