use deriche_image::{PixelCast, Volume};

use crate::error::FilterError;
use crate::operator::GaussianDerivativeOperator;
use crate::parallel::ExecutionStrategy;
use crate::recursive::{GaussianOrder, RecursiveGaussian, RecursiveKernel};
use crate::Real;

use super::{apply_line_filter, kernels::ConvolutionKernel};

fn recursive_passes<R, T, const N: usize>(
    src: &Volume<T, N>,
    kernels: [RecursiveGaussian; N],
    strategy: ExecutionStrategy,
) -> Result<Volume<T, N>, FilterError>
where
    R: Real,
    T: PixelCast,
{
    let mut real = src.cast::<R>()?;
    for (axis, kernel) in kernels.iter().enumerate() {
        let coefficients = kernel.set_up(real.spacing()[axis])?.to_precision::<R>();
        real = apply_line_filter(&real, axis, &coefficients, strategy)?;
    }
    Ok(real.cast()?)
}

/// Smooth a volume with a recursive Gaussian along every axis.
///
/// # Arguments
///
/// * `src` - The source volume.
/// * `sigmas` - The standard deviation per axis, in physical units.
/// * `strategy` - The execution strategy.
///
/// The computation runs in `R`; intermediate passes are not rounded to `T`.
///
/// # Examples
///
/// ```rust
/// use deriche_image::Volume;
/// use deriche_imgproc::filter::smooth_recursive_gaussian;
/// use deriche_imgproc::parallel::ExecutionStrategy;
///
/// let volume = Volume::<u8, 3>::from_shape_val([4, 5, 6], 42);
/// let smoothed =
///     smooth_recursive_gaussian::<f64, _, 3>(&volume, [1.0, 2.0, 3.0], ExecutionStrategy::Auto)
///         .unwrap();
/// assert!(smoothed.as_slice().iter().all(|&v| v == 42));
/// ```
pub fn smooth_recursive_gaussian<R, T, const N: usize>(
    src: &Volume<T, N>,
    sigmas: [f64; N],
    strategy: ExecutionStrategy,
) -> Result<Volume<T, N>, FilterError>
where
    R: Real,
    T: PixelCast,
{
    recursive_passes::<R, T, N>(src, sigmas.map(RecursiveGaussian::new), strategy)
}

/// Apply a recursive Gaussian derivative with a per-axis order.
///
/// `orders[axis]` selects smoothing, first or second derivative along each
/// axis; e.g. `[Zero, First]` on a 2-D volume is the gradient component
/// along axis 1 smoothed along axis 0.
///
/// # Arguments
///
/// * `src` - The source volume.
/// * `sigma` - The standard deviation, in physical units.
/// * `orders` - The derivative order per axis.
/// * `normalize_across_scale` - Multiply each derivative by `sigma^order`.
/// * `strategy` - The execution strategy.
pub fn recursive_gaussian_derivative<R, T, const N: usize>(
    src: &Volume<T, N>,
    sigma: f64,
    orders: [GaussianOrder; N],
    normalize_across_scale: bool,
    strategy: ExecutionStrategy,
) -> Result<Volume<T, N>, FilterError>
where
    R: Real,
    T: PixelCast,
{
    let kernels = orders.map(|order| {
        RecursiveGaussian::new(sigma)
            .with_order(order)
            .with_normalize_across_scale(normalize_across_scale)
    });
    recursive_passes::<R, T, N>(src, kernels, strategy)
}

/// Smooth a volume with the sampled discrete Gaussian along every axis.
///
/// The kernels come from [`GaussianDerivativeOperator`] with the spacing of
/// each axis, so `variances` are in physical units.
///
/// # Arguments
///
/// * `src` - The source volume.
/// * `variances` - The variance per axis.
/// * `maximum_error` - The kernel mass that may be truncated, in `(0, 1)`.
/// * `maximum_kernel_width` - The maximum kernel radius.
/// * `strategy` - The execution strategy.
pub fn discrete_gaussian<R, T, const N: usize>(
    src: &Volume<T, N>,
    variances: [f64; N],
    maximum_error: f64,
    maximum_kernel_width: usize,
    strategy: ExecutionStrategy,
) -> Result<Volume<T, N>, FilterError>
where
    R: Real,
    T: PixelCast,
{
    let mut real = src.cast::<R>()?;
    for (axis, &variance) in variances.iter().enumerate() {
        let coefficients = GaussianDerivativeOperator::default()
            .with_variance(variance)
            .with_spacing(real.spacing()[axis])
            .with_maximum_error(maximum_error)
            .with_maximum_kernel_width(maximum_kernel_width)
            .generate_coefficients()?;
        let kernel = ConvolutionKernel::<R>::new(&coefficients)?;
        real = apply_line_filter(&real, axis, &kernel, strategy)?;
    }
    Ok(real.cast()?)
}
