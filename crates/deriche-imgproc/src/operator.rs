use crate::error::FilterError;
use crate::filter::kernels::derivative_operator;
use crate::special::{bessel_i0_scaled, bessel_i1_scaled, bessel_i_scaled};
use crate::summation::CompensatedSum;

/// Sampled Gaussian (derivative) kernel generator.
///
/// The zero order kernel is the discrete analogue of the Gaussian,
/// `exp(-t) I_n(t)` with `t` the variance in pixels, which keeps the
/// semi-group property of the continuous kernel. Derivative kernels convolve
/// it with a finite difference operator.
///
/// Coefficients are accumulated from the center outwards until their mass
/// reaches `1 - maximum_error`. The maximum kernel width caps the radius, so
/// a truncated kernel has `2 * maximum_kernel_width + 1` coefficients.
///
/// # Examples
///
/// ```rust
/// use deriche_imgproc::operator::GaussianDerivativeOperator;
///
/// let kernel = GaussianDerivativeOperator::default()
///     .with_variance(4.0)
///     .with_maximum_error(0.01)
///     .generate_coefficients()
///     .unwrap();
///
/// assert_eq!(kernel.len(), 11);
/// assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianDerivativeOperator {
    variance: f64,
    order: u32,
    spacing: f64,
    maximum_error: f64,
    maximum_kernel_width: usize,
    normalize_across_scale: bool,
}

impl Default for GaussianDerivativeOperator {
    fn default() -> Self {
        Self {
            variance: 1.0,
            order: 0,
            spacing: 1.0,
            maximum_error: 0.005,
            maximum_kernel_width: 30,
            normalize_across_scale: true,
        }
    }
}

impl GaussianDerivativeOperator {
    /// Set the variance of the Gaussian, in physical units.
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance;
        self
    }

    /// Set the derivative order.
    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    /// Set the pixel spacing along the filtered axis.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Set the mass the kernel may leave out, in `(0, 1)`.
    pub fn with_maximum_error(mut self, maximum_error: f64) -> Self {
        self.maximum_error = maximum_error;
        self
    }

    /// Set the maximum kernel radius.
    pub fn with_maximum_kernel_width(mut self, maximum_kernel_width: usize) -> Self {
        self.maximum_kernel_width = maximum_kernel_width;
        self
    }

    /// Scale derivatives by `variance^(order / 2)`.
    pub fn with_normalize_across_scale(mut self, normalize: bool) -> Self {
        self.normalize_across_scale = normalize;
        self
    }

    /// The variance.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// The derivative order.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// The pixel spacing.
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// The maximum truncation error.
    pub fn maximum_error(&self) -> f64 {
        self.maximum_error
    }

    /// The maximum kernel radius.
    pub fn maximum_kernel_width(&self) -> usize {
        self.maximum_kernel_width
    }

    /// Whether derivatives are normalized across scale.
    pub fn normalize_across_scale(&self) -> bool {
        self.normalize_across_scale
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// If the variance is negative or not finite, the spacing is not a
    /// positive finite number, the maximum error is outside `(0, 1)` or the
    /// maximum kernel width is zero.
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.variance.is_finite() || self.variance < 0.0 {
            return Err(FilterError::InvalidVariance(self.variance));
        }
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Err(FilterError::InvalidSpacing(self.spacing));
        }
        if !(self.maximum_error > 0.0 && self.maximum_error < 1.0) {
            return Err(FilterError::InvalidMaximumError(self.maximum_error));
        }
        if self.maximum_kernel_width == 0 {
            return Err(FilterError::InvalidKernelWidth(self.maximum_kernel_width));
        }
        Ok(())
    }

    /// Generate the zero order kernel.
    ///
    /// The result is symmetric, has odd length and sums to one.
    ///
    /// # Errors
    ///
    /// If the parameters are invalid, see [`Self::validate`].
    pub fn generate_gaussian_coefficients(&self) -> Result<Vec<f64>, FilterError> {
        self.validate()?;

        let pixel_variance = self.variance / (self.spacing * self.spacing);
        let cap = 1.0 - self.maximum_error;

        // exp(-t) I_n(t), evaluated scaled so large t neither underflows nor overflows
        let mut half = vec![
            bessel_i0_scaled(pixel_variance),
            bessel_i1_scaled(pixel_variance),
        ];
        let mut sum = CompensatedSum::from(half[0]);
        sum += 2.0 * half[1];

        let mut n = 2;
        while sum.sum() < cap {
            if half.len() > self.maximum_kernel_width {
                log::warn!(
                    "Kernel radius exceeded the maximum width of {}, truncated to {} coefficients",
                    self.maximum_kernel_width,
                    2 * half.len() - 1
                );
                break;
            }

            let c = bessel_i_scaled(n, pixel_variance)?;
            half.push(c);
            sum += 2.0 * c;

            if c < sum.sum() * f64::EPSILON {
                log::warn!(
                    "Kernel failed to accumulate to one: remainder {}, last coefficient {}",
                    cap - sum.sum(),
                    c
                );
                break;
            }
            n += 1;
        }

        // smallest terms first
        let tail: CompensatedSum = half[1..].iter().rev().copied().collect();
        let mut total = CompensatedSum::from(2.0 * tail.sum());
        total += half[0];
        let total = total.sum();
        half.iter_mut().for_each(|c| *c /= total);

        let mut coefficients = Vec::with_capacity(2 * half.len() - 1);
        coefficients.extend(half[1..].iter().rev());
        coefficients.extend(half.iter());
        Ok(coefficients)
    }

    /// Generate the kernel of the configured derivative order.
    ///
    /// For order zero this is [`Self::generate_gaussian_coefficients`].
    /// Otherwise the Gaussian is padded on both sides with its edge values and
    /// convolved with [`derivative_operator`]; the result is divided by
    /// `spacing^order`, and multiplied by `variance^(order / 2)` when
    /// normalizing across scale. Odd orders are antisymmetric.
    ///
    /// # Errors
    ///
    /// If the parameters are invalid, see [`Self::validate`].
    pub fn generate_coefficients(&self) -> Result<Vec<f64>, FilterError> {
        let gaussian = self.generate_gaussian_coefficients()?;
        if self.order == 0 {
            return Ok(gaussian);
        }

        let mut norm = if self.normalize_across_scale {
            self.variance.powf(self.order as f64 / 2.0)
        } else {
            1.0
        };
        norm /= self.spacing.powi(self.order as i32);

        let derivative = derivative_operator(self.order);
        let size = derivative.len();
        let radius = (size - 1) / 2;

        // the output needs radius - 1 extra samples per side, which reads
        // 2 * radius - 1 padded samples
        let (Some(&front), Some(&back)) = (gaussian.first(), gaussian.last()) else {
            return Ok(gaussian);
        };
        let mut padded = vec![front; 2 * radius - 1];
        padded.extend_from_slice(&gaussian);
        padded.extend(std::iter::repeat(back).take(2 * radius - 1));

        let coefficients = (radius..padded.len() - radius)
            .map(|i| {
                let mut conv = CompensatedSum::new();
                for (j, &d) in derivative.iter().rev().enumerate() {
                    conv += padded[i + j - size / 2] * d;
                }
                norm * conv.sum()
            })
            .collect();

        Ok(coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::special::bessel_i0;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn assert_symmetric(coefficients: &[f64], sign: f64) {
        let n = coefficients.len();
        assert_eq!(n % 2, 1);
        for i in 0..n / 2 {
            assert_relative_eq!(
                coefficients[i],
                sign * coefficients[n - 1 - i],
                max_relative = 1e-12,
                epsilon = 1e-15
            );
        }
    }

    #[test]
    fn test_default() {
        let op = GaussianDerivativeOperator::default();
        assert_eq!(op.variance(), 1.0);
        assert_eq!(op.order(), 0);
        assert_eq!(op.spacing(), 1.0);
        assert_eq!(op.maximum_error(), 0.005);
        assert_eq!(op.maximum_kernel_width(), 30);
        assert!(op.normalize_across_scale());
    }

    #[test]
    fn test_gaussian_sums_to_one() -> Result<(), FilterError> {
        for &variance in &[0.25, 1.0, 4.0, 16.0] {
            for &spacing in &[0.5, 1.0, 2.0] {
                let coefficients = GaussianDerivativeOperator::default()
                    .with_variance(variance)
                    .with_spacing(spacing)
                    .generate_gaussian_coefficients()?;
                assert_abs_diff_eq!(coefficients.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
                assert_symmetric(&coefficients, 1.0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_reference_sampling() -> Result<(), FilterError> {
        let coefficients = GaussianDerivativeOperator::default()
            .with_variance(4.0)
            .with_maximum_error(0.01)
            .generate_coefficients()?;

        assert_eq!(coefficients.len(), 11);

        // exp(-t) I0(t) renormalized over the retained support
        let peak = (-4.0f64).exp() * bessel_i0(4.0);
        assert_relative_eq!(coefficients[5], peak, max_relative = 0.01);
        Ok(())
    }

    #[test]
    fn test_zero_variance_is_identity() -> Result<(), FilterError> {
        let coefficients = GaussianDerivativeOperator::default()
            .with_variance(0.0)
            .generate_gaussian_coefficients()?;
        assert_eq!(coefficients, vec![0.0, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_width_cap() -> Result<(), FilterError> {
        let op = GaussianDerivativeOperator::default()
            .with_variance(100.0)
            .with_maximum_error(1e-4);

        let capped = op.clone().with_maximum_kernel_width(5).generate_coefficients()?;
        assert_eq!(capped.len(), 11);
        assert_abs_diff_eq!(capped.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        // a wider cap keeps more of the tail, so the center loses weight
        let wider = op.clone().with_maximum_kernel_width(20).generate_coefficients()?;
        assert_eq!(wider.len(), 41);
        assert!(wider[20] < capped[5]);

        // the smallest cap keeps the center and one neighbour per side
        for width in 1..=3 {
            let kernel = op.clone().with_maximum_kernel_width(width).generate_coefficients()?;
            assert_eq!(kernel.len(), 2 * width + 1);
            assert_abs_diff_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            assert_symmetric(&kernel, 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_large_variance() -> Result<(), FilterError> {
        // exp(-t) underflows and I0(t) overflows above t ~ 709
        for &variance in &[720.0, 1000.0] {
            let coefficients = GaussianDerivativeOperator::default()
                .with_variance(variance)
                .with_maximum_kernel_width(200)
                .generate_gaussian_coefficients()?;
            assert!(coefficients.iter().all(|c| c.is_finite() && *c > 0.0));
            assert!(coefficients.len() > 100 && coefficients.len() < 401);
            assert_abs_diff_eq!(coefficients.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
            assert_symmetric(&coefficients, 1.0);

            // close to the continuous Gaussian peak 1 / sqrt(2 pi t)
            let center = coefficients[coefficients.len() / 2];
            let peak = 1.0 / (2.0 * std::f64::consts::PI * variance).sqrt();
            assert_relative_eq!(center, peak, max_relative = 0.01);
        }
        Ok(())
    }

    #[test]
    fn test_first_derivative_antisymmetric() -> Result<(), FilterError> {
        let coefficients = GaussianDerivativeOperator::default()
            .with_variance(2.0)
            .with_order(1)
            .generate_coefficients()?;

        let center = coefficients.len() / 2;
        assert_abs_diff_eq!(coefficients[center], 0.0, epsilon = 1e-15);
        assert_symmetric(&coefficients, -1.0);
        assert_abs_diff_eq!(coefficients.iter().sum::<f64>(), 0.0, epsilon = 1e-12);

        // weights after the center are negative for a convolution kernel
        assert!(coefficients[center + 1] < 0.0);
        Ok(())
    }

    #[test]
    fn test_second_derivative_symmetric() -> Result<(), FilterError> {
        let gaussian = GaussianDerivativeOperator::default()
            .with_variance(2.0)
            .generate_coefficients()?;
        let coefficients = GaussianDerivativeOperator::default()
            .with_variance(2.0)
            .with_order(2)
            .generate_coefficients()?;

        assert_eq!(coefficients.len(), gaussian.len());
        assert_symmetric(&coefficients, 1.0);
        assert!(coefficients[coefficients.len() / 2] < 0.0);
        Ok(())
    }

    #[test]
    fn test_higher_order_grows_kernel() -> Result<(), FilterError> {
        let op = GaussianDerivativeOperator::default().with_variance(2.0);
        let gaussian = op.generate_gaussian_coefficients()?;
        let third = op.with_order(3).generate_coefficients()?;
        assert_eq!(third.len(), gaussian.len() + 2);
        assert_symmetric(&third, -1.0);
        Ok(())
    }

    #[test]
    fn test_derivative_normalization() -> Result<(), FilterError> {
        let op = GaussianDerivativeOperator::default()
            .with_variance(4.0)
            .with_order(1);
        let normalized = op.clone().generate_coefficients()?;
        let raw = op
            .clone()
            .with_normalize_across_scale(false)
            .generate_coefficients()?;
        let coarse = op
            .with_normalize_across_scale(false)
            .with_spacing(2.0)
            .with_variance(16.0)
            .generate_coefficients()?;

        // sqrt(variance) = 2
        for (n, r) in normalized.iter().zip(&raw) {
            assert_relative_eq!(*n, 2.0 * r, max_relative = 1e-12);
        }
        // same pixel variance, derivative per physical unit halves
        for (c, r) in coarse.iter().zip(&raw) {
            assert_relative_eq!(*c, 0.5 * r, max_relative = 1e-12, epsilon = 1e-18);
        }
        Ok(())
    }

    #[test]
    fn test_validation() {
        let op = GaussianDerivativeOperator::default();
        assert_eq!(
            op.clone().with_variance(-1.0).validate(),
            Err(FilterError::InvalidVariance(-1.0))
        );
        assert_eq!(
            op.clone().with_spacing(0.0).validate(),
            Err(FilterError::InvalidSpacing(0.0))
        );
        assert_eq!(
            op.clone().with_maximum_error(1.0).validate(),
            Err(FilterError::InvalidMaximumError(1.0))
        );
        assert_eq!(
            op.clone().with_maximum_kernel_width(0).validate(),
            Err(FilterError::InvalidKernelWidth(0))
        );
        assert!(op.generate_coefficients().is_ok());
    }
}
