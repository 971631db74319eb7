use crate::{error::ImageError, pixel::PixelCast};

/// Compute the row-major strides of a shape.
///
/// The last axis is contiguous in memory.
///
/// # Examples
///
/// ```rust
/// use deriche_image::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape([2, 3, 4]), [12, 4, 1]);
/// ```
pub fn get_strides_from_shape<const N: usize>(shape: [usize; N]) -> [usize; N] {
    let mut strides: [usize; N] = [0; N];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// An N-dimensional volume with physical pixel spacing.
///
/// The data is stored in row-major order: `shape[N - 1]` is the contiguous
/// axis. Every axis carries a spacing in physical units (millimetres for
/// medical images), which filters use to express their parameters in world
/// units rather than in pixels.
///
/// A *line* along axis `a` is the 1-D sequence of `shape[a]` samples obtained
/// by fixing every other coordinate. Lines along `a` are numbered by
/// enumerating the remaining coordinates in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume<T, const N: usize> {
    data: Vec<T>,
    shape: [usize; N],
    strides: [usize; N],
    spacing: [f64; N],
}

impl<T, const N: usize> Volume<T, N> {
    /// Create a new volume from a shape and row-major data.
    ///
    /// The spacing defaults to `1.0` along every axis.
    ///
    /// # Errors
    ///
    /// If the data length does not match the product of the extents.
    pub fn new(shape: [usize; N], data: Vec<T>) -> Result<Self, ImageError> {
        let numel = shape.iter().product::<usize>();
        if numel != data.len() {
            return Err(ImageError::InvalidShape {
                expected: numel,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            shape,
            strides: get_strides_from_shape(shape),
            spacing: [1.0; N],
        })
    }

    /// Create a volume filled with a single value.
    pub fn from_shape_val(shape: [usize; N], val: T) -> Self
    where
        T: Clone,
    {
        let numel = shape.iter().product::<usize>();
        Self {
            data: vec![val; numel],
            shape,
            strides: get_strides_from_shape(shape),
            spacing: [1.0; N],
        }
    }

    /// Create a volume by evaluating `f` at every index.
    ///
    /// ```rust
    /// use deriche_image::Volume;
    ///
    /// let v = Volume::<usize, 2>::from_shape_fn([2, 2], |[r, c]| r * 10 + c);
    /// assert_eq!(v.as_slice(), &[0, 1, 10, 11]);
    /// ```
    pub fn from_shape_fn<F>(shape: [usize; N], mut f: F) -> Self
    where
        F: FnMut([usize; N]) -> T,
    {
        let numel = shape.iter().product::<usize>();
        let strides = get_strides_from_shape(shape);
        let data = (0..numel)
            .map(|offset| f(index_from_offset(offset, &shape, &strides)))
            .collect();

        Self {
            data,
            shape,
            strides,
            spacing: [1.0; N],
        }
    }

    /// Consume the volume and return it with the given spacing.
    ///
    /// # Errors
    ///
    /// If any spacing component is not finite and strictly positive.
    pub fn with_spacing(mut self, spacing: [f64; N]) -> Result<Self, ImageError> {
        self.set_spacing(spacing)?;
        Ok(self)
    }

    /// Set the physical spacing of every axis.
    ///
    /// # Errors
    ///
    /// If any spacing component is not finite and strictly positive. The
    /// volume is left untouched in that case.
    pub fn set_spacing(&mut self, spacing: [f64; N]) -> Result<(), ImageError> {
        if let Some((axis, &value)) = spacing
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(ImageError::InvalidSpacing { axis, value });
        }
        self.spacing = spacing;
        Ok(())
    }

    /// The extent of every axis.
    #[inline]
    pub fn shape(&self) -> [usize; N] {
        self.shape
    }

    /// The row-major strides, in elements.
    #[inline]
    pub fn strides(&self) -> [usize; N] {
        self.strides
    }

    /// The physical spacing of every axis.
    #[inline]
    pub fn spacing(&self) -> [f64; N] {
        self.spacing
    }

    /// The number of axes.
    #[inline]
    pub fn dimension(&self) -> usize {
        N
    }

    /// The number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Whether the volume holds no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The data as a row-major slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The data as a mutable row-major slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the volume and return its data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Get the element at `index`, or `None` when out of bounds.
    pub fn get(&self, index: [usize; N]) -> Option<&T> {
        self.offset_of(index).map(|offset| &self.data[offset])
    }

    /// Get a mutable reference to the element at `index`.
    pub fn get_mut(&mut self, index: [usize; N]) -> Option<&mut T> {
        self.offset_of(index).map(|offset| &mut self.data[offset])
    }

    fn offset_of(&self, index: [usize; N]) -> Option<usize> {
        let mut offset = 0;
        for ((&idx, dim_size), stride) in index.iter().zip(self.shape).zip(self.strides) {
            if idx >= dim_size {
                return None;
            }
            offset += idx * stride;
        }
        Some(offset)
    }

    /// Apply `f` to every element, keeping shape and spacing.
    pub fn map<U, F>(&self, f: F) -> Volume<U, N>
    where
        F: Fn(&T) -> U,
    {
        Volume {
            data: self.data.iter().map(f).collect(),
            shape: self.shape,
            strides: self.strides,
            spacing: self.spacing,
        }
    }

    /// Convert every element to another pixel type.
    ///
    /// Integer targets round and saturate.
    ///
    /// # Errors
    ///
    /// If a value has no representation in the target type (NaN into an
    /// integer type).
    pub fn cast<U>(&self) -> Result<Volume<U, N>, ImageError>
    where
        T: PixelCast,
        U: PixelCast,
    {
        let data = self
            .data
            .iter()
            .map(|x| {
                let val = x.to_real();
                U::try_from_real(val).ok_or(ImageError::CastError(val))
            })
            .collect::<Result<Vec<U>, ImageError>>()?;

        Ok(Volume {
            data,
            shape: self.shape,
            strides: self.strides,
            spacing: self.spacing,
        })
    }

    fn check_axis(&self, axis: usize) -> Result<(), ImageError> {
        if axis >= N {
            return Err(ImageError::AxisOutOfBounds {
                axis,
                dimension: N,
            });
        }
        Ok(())
    }

    /// The number of lines parallel to `axis`.
    ///
    /// # Errors
    ///
    /// If the axis does not exist.
    pub fn num_lines(&self, axis: usize) -> Result<usize, ImageError> {
        self.check_axis(axis)?;
        Ok(self
            .shape
            .iter()
            .enumerate()
            .filter(|&(a, _)| a != axis)
            .map(|(_, &extent)| extent)
            .product())
    }

    /// The offset of the first sample of `line` along `axis`.
    ///
    /// Consecutive samples of the line are `strides()[axis]` elements apart.
    ///
    /// # Errors
    ///
    /// If the axis does not exist or the line index is out of bounds.
    pub fn line_offset(&self, axis: usize, line: usize) -> Result<usize, ImageError> {
        let num_lines = self.num_lines(axis)?;
        if line >= num_lines {
            return Err(ImageError::LineOutOfBounds { line, num_lines });
        }

        let inner = self.strides[axis];
        let outer = line / inner;
        Ok(outer * self.shape[axis] * inner + line % inner)
    }

    /// Copy the samples of `line` along `axis` into `buf`.
    ///
    /// # Errors
    ///
    /// If the axis or line is out of bounds, or `buf.len() != shape()[axis]`.
    pub fn read_line(&self, axis: usize, line: usize, buf: &mut [T]) -> Result<(), ImageError>
    where
        T: Copy,
    {
        let offset = self.line_offset(axis, line)?;
        self.check_line_len(axis, buf.len())?;

        let stride = self.strides[axis];
        for (i, dst) in buf.iter_mut().enumerate() {
            *dst = self.data[offset + i * stride];
        }
        Ok(())
    }

    /// Store `buf` into `line` along `axis`.
    ///
    /// # Errors
    ///
    /// If the axis or line is out of bounds, or `buf.len() != shape()[axis]`.
    pub fn write_line(&mut self, axis: usize, line: usize, buf: &[T]) -> Result<(), ImageError>
    where
        T: Copy,
    {
        let offset = self.line_offset(axis, line)?;
        self.check_line_len(axis, buf.len())?;

        let stride = self.strides[axis];
        for (i, src) in buf.iter().enumerate() {
            self.data[offset + i * stride] = *src;
        }
        Ok(())
    }

    fn check_line_len(&self, axis: usize, len: usize) -> Result<(), ImageError> {
        if len != self.shape[axis] {
            return Err(ImageError::LineLengthMismatch {
                expected: self.shape[axis],
                actual: len,
            });
        }
        Ok(())
    }
}

fn index_from_offset<const N: usize>(
    offset: usize,
    shape: &[usize; N],
    strides: &[usize; N],
) -> [usize; N] {
    let mut index = [0; N];
    for axis in 0..N {
        index[axis] = (offset / strides[axis]) % shape[axis];
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor() -> Result<(), ImageError> {
        let v = Volume::<u8, 3>::new([2, 3, 4], vec![0; 24])?;
        assert_eq!(v.shape(), [2, 3, 4]);
        assert_eq!(v.strides(), [12, 4, 1]);
        assert_eq!(v.spacing(), [1.0; 3]);
        assert_eq!(v.numel(), 24);
        assert_eq!(v.dimension(), 3);
        Ok(())
    }

    #[test]
    fn test_invalid_shape() {
        let res = Volume::<u8, 2>::new([2, 3], vec![0; 5]);
        assert_eq!(
            res,
            Err(ImageError::InvalidShape {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn test_spacing_validation() -> Result<(), ImageError> {
        let mut v = Volume::<f32, 2>::from_shape_val([2, 2], 0.0);
        v.set_spacing([0.5, 2.0])?;
        assert_eq!(v.spacing(), [0.5, 2.0]);

        let res = v.set_spacing([1.0, 0.0]);
        assert_eq!(
            res,
            Err(ImageError::InvalidSpacing {
                axis: 1,
                value: 0.0
            })
        );
        assert!(v.set_spacing([f64::NAN, 1.0]).is_err());
        // unchanged after a rejected update
        assert_eq!(v.spacing(), [0.5, 2.0]);
        Ok(())
    }

    #[test]
    fn test_get() {
        let v = Volume::<usize, 3>::from_shape_fn([2, 3, 4], |[z, y, x]| z * 100 + y * 10 + x);
        assert_eq!(v.get([1, 2, 3]), Some(&123));
        assert_eq!(v.get([0, 0, 0]), Some(&0));
        assert!(v.get([2, 0, 0]).is_none());
        assert!(v.get([0, 0, 4]).is_none());
    }

    #[test]
    fn test_num_lines() -> Result<(), ImageError> {
        let v = Volume::<u8, 3>::from_shape_val([2, 3, 4], 0);
        assert_eq!(v.num_lines(0)?, 12);
        assert_eq!(v.num_lines(1)?, 8);
        assert_eq!(v.num_lines(2)?, 6);
        assert_eq!(
            v.num_lines(3),
            Err(ImageError::AxisOutOfBounds {
                axis: 3,
                dimension: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_read_line_every_axis() -> Result<(), ImageError> {
        let v = Volume::<usize, 3>::from_shape_fn([2, 3, 4], |[z, y, x]| z * 100 + y * 10 + x);

        let mut buf = vec![0; 4];
        v.read_line(2, 5, &mut buf)?;
        // line 5 along x is (z=1, y=2)
        assert_eq!(buf, vec![120, 121, 122, 123]);

        let mut buf = vec![0; 3];
        v.read_line(1, 6, &mut buf)?;
        // line 6 along y is (z=1, x=2)
        assert_eq!(buf, vec![102, 112, 122]);

        let mut buf = vec![0; 2];
        v.read_line(0, 11, &mut buf)?;
        // line 11 along z is (y=2, x=3)
        assert_eq!(buf, vec![23, 123]);
        Ok(())
    }

    #[test]
    fn test_write_line_visits_every_element_once() -> Result<(), ImageError> {
        for axis in 0..3 {
            let mut v = Volume::<u32, 3>::from_shape_val([3, 4, 5], 0);
            let extent = v.shape()[axis];
            for line in 0..v.num_lines(axis)? {
                let mut buf = vec![0; extent];
                v.read_line(axis, line, &mut buf)?;
                buf.iter_mut().for_each(|x| *x += 1);
                v.write_line(axis, line, &buf)?;
            }
            assert!(v.as_slice().iter().all(|&x| x == 1), "axis {axis}");
        }
        Ok(())
    }

    #[test]
    fn test_line_errors() {
        let mut v = Volume::<u8, 2>::from_shape_val([2, 3], 0);
        let mut buf = vec![0; 2];
        assert_eq!(
            v.read_line(1, 0, &mut buf),
            Err(ImageError::LineLengthMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            v.write_line(0, 3, &buf),
            Err(ImageError::LineOutOfBounds {
                line: 3,
                num_lines: 3
            })
        );
    }

    #[test]
    fn test_map_and_cast() -> Result<(), ImageError> {
        let v = Volume::<f32, 2>::new([1, 3], vec![0.4, 1.6, 300.0])?.with_spacing([2.0, 3.0])?;
        let doubled = v.map(|x| x * 2.0);
        assert_eq!(doubled.as_slice(), &[0.8, 3.2, 600.0]);
        assert_eq!(doubled.spacing(), [2.0, 3.0]);

        let bytes = v.cast::<u8>()?;
        assert_eq!(bytes.as_slice(), &[0, 2, 255]);

        let nan = Volume::<f32, 1>::new([1], vec![f32::NAN])?;
        assert!(matches!(nan.cast::<u8>(), Err(ImageError::CastError(_))));
        Ok(())
    }
}
