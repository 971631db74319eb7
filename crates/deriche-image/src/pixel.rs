/// Conversion between a pixel storage type and the `f64` domain used for
/// arithmetic.
///
/// Integer types round to nearest and saturate at their bounds, so a filtered
/// `u8` volume never wraps around.
pub trait PixelCast: Copy + Send + Sync {
    /// Convert the pixel to `f64`.
    fn to_real(&self) -> f64;

    /// Convert from `f64`, rounding and saturating when needed.
    fn from_real(val: f64) -> Self;

    /// Convert from `f64`, returning `None` when the value has no meaningful
    /// representation (NaN into an integer type).
    fn try_from_real(val: f64) -> Option<Self> {
        Some(Self::from_real(val))
    }
}

impl PixelCast for f32 {
    fn to_real(&self) -> f64 {
        *self as f64
    }

    fn from_real(val: f64) -> Self {
        val as f32
    }
}

impl PixelCast for f64 {
    fn to_real(&self) -> f64 {
        *self
    }

    fn from_real(val: f64) -> Self {
        val
    }
}

macro_rules! impl_integer_pixel {
    ($($ty:ty),*) => {
        $(
            impl PixelCast for $ty {
                fn to_real(&self) -> f64 {
                    *self as f64
                }

                fn from_real(val: f64) -> Self {
                    val.round().clamp(<$ty>::MIN as f64, <$ty>::MAX as f64) as $ty
                }

                fn try_from_real(val: f64) -> Option<Self> {
                    if val.is_nan() {
                        return None;
                    }
                    Some(Self::from_real(val))
                }
            }
        )*
    };
}

impl_integer_pixel!(u8, u16, i16, i32);
