use crate::error::FilterError;

use super::{RecursiveCoefficients, RecursiveKernel, Symmetry};

/// Derivative order of a recursive Gaussian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GaussianOrder {
    /// Smoothing.
    #[default]
    Zero,
    /// First derivative.
    First,
    /// Second derivative.
    Second,
}

impl GaussianOrder {
    /// The order as an integer.
    pub fn as_u32(&self) -> u32 {
        match self {
            GaussianOrder::Zero => 0,
            GaussianOrder::First => 1,
            GaussianOrder::Second => 2,
        }
    }
}

/// Two term exponential series `(a0 cos(w0 x) + a1 sin(w0 x)) exp(-b0 x) +
/// (c0 cos(w1 x) + c1 sin(w1 x)) exp(-b1 x)` fitted to a Gaussian derivative
/// of unit standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSeries {
    /// Cosine amplitude of the first term.
    pub a0: f64,
    /// Sine amplitude of the first term.
    pub a1: f64,
    /// Decay of the first term.
    pub b0: f64,
    /// Decay of the second term.
    pub b1: f64,
    /// Cosine amplitude of the second term.
    pub c0: f64,
    /// Sine amplitude of the second term.
    pub c1: f64,
    /// Frequency of the first term.
    pub w0: f64,
    /// Frequency of the second term.
    pub w1: f64,
}

impl ExponentialSeries {
    /// Deriche's fit for the given order.
    pub fn deriche(order: GaussianOrder) -> Self {
        let (a0, a1, c0, c1) = match order {
            GaussianOrder::Zero => (1.3530, 1.8151, -0.3531, 0.0902),
            GaussianOrder::First => (-0.6724, -3.4327, 0.6724, 0.6100),
            GaussianOrder::Second => (-1.3563, 5.2318, 0.3446, -2.2355),
        };
        Self {
            a0,
            a1,
            b0: 1.3932,
            b1: 1.3732,
            c0,
            c1,
            w0: 0.6681,
            w1: 2.0787,
        }
    }

    /// Poles of the series scaled to a standard deviation of `s` samples,
    /// as `(cos(w0/s), sin(w0/s), exp(-b0/s), cos(w1/s), sin(w1/s), exp(-b1/s))`.
    fn poles(&self, s: f64) -> [f64; 6] {
        [
            (self.w0 / s).cos(),
            (self.w0 / s).sin(),
            (-self.b0 / s).exp(),
            (self.w1 / s).cos(),
            (self.w1 / s).sin(),
            (-self.b1 / s).exp(),
        ]
    }

    /// Denominator of the causal recurrence.
    pub fn denominator(&self, s: f64) -> [f64; 4] {
        let [cos0, _, e0, cos1, _, e1] = self.poles(s);
        [
            -2.0 * (e1 * cos1 + e0 * cos0),
            4.0 * cos1 * cos0 * e0 * e1 + e0 * e0 + e1 * e1,
            -2.0 * cos0 * e0 * e1 * e1 - 2.0 * cos1 * e1 * e0 * e0,
            e0 * e0 * e1 * e1,
        ]
    }

    /// Numerator of the causal recurrence.
    pub fn numerator(&self, s: f64) -> [f64; 4] {
        let [cos0, sin0, e0, cos1, sin1, e1] = self.poles(s);
        let (a0, a1, c0, c1) = (self.a0, self.a1, self.c0, self.c1);
        [
            a0 + c0,
            e1 * (c1 * sin1 - (c0 + 2.0 * a0) * cos1) + e0 * (a1 * sin0 - (a0 + 2.0 * c0) * cos0),
            2.0 * e0 * e1 * ((a0 + c0) * cos1 * cos0 - (a1 * cos1 * sin0 + c1 * cos0 * sin1))
                + c0 * e0 * e0
                + a0 * e1 * e1,
            e1 * e0 * e0 * (c1 * sin1 - c0 * cos1) + e0 * e1 * e1 * (a1 * sin0 - a0 * cos0),
        ]
    }
}

/// Zeroth, first and second moments `(sum c[k], sum k c[k], sum k^2 c[k])`.
fn moments(c: &[f64]) -> (f64, f64, f64) {
    c.iter()
        .enumerate()
        .fold((0.0, 0.0, 0.0), |(sum, first, second), (k, &v)| {
            let k = k as f64;
            (sum + v, first + k * v, second + k * k * v)
        })
}

/// Deriche's recursive approximation of the Gaussian and its derivatives.
///
/// The response is normalized so that the smoothing filter preserves
/// constants, the first derivative of a unit ramp is one and the second
/// derivative of `x^2 / 2` is one, in physical units. With
/// `normalize_across_scale` the derivatives are multiplied by `sigma^order`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecursiveGaussian {
    /// Standard deviation, in physical units.
    pub sigma: f64,
    /// Derivative order.
    pub order: GaussianOrder,
    /// Scale derivative responses by `sigma^order`.
    pub normalize_across_scale: bool,
}

impl Default for RecursiveGaussian {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            order: GaussianOrder::Zero,
            normalize_across_scale: false,
        }
    }
}

impl RecursiveGaussian {
    /// A smoothing filter with standard deviation `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            ..Default::default()
        }
    }

    /// Set the derivative order.
    pub fn with_order(mut self, order: GaussianOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the scale normalization of derivatives.
    pub fn with_normalize_across_scale(mut self, normalize: bool) -> Self {
        self.normalize_across_scale = normalize;
        self
    }
}

impl RecursiveKernel for RecursiveGaussian {
    fn symmetry(&self) -> Symmetry {
        match self.order {
            GaussianOrder::First => Symmetry::Antisymmetric,
            GaussianOrder::Zero | GaussianOrder::Second => Symmetry::Symmetric,
        }
    }

    fn set_up(&self, spacing: f64) -> Result<RecursiveCoefficients<f64>, FilterError> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(FilterError::InvalidSigma(self.sigma));
        }
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(FilterError::InvalidSpacing(spacing));
        }

        let s = self.sigma / spacing;
        let series = ExponentialSeries::deriche(self.order);
        let d = series.denominator(s);
        let (sd, dd, ed) = moments(&[1.0, d[0], d[1], d[2], d[3]]);

        let scale = if self.normalize_across_scale {
            self.sigma.powi(self.order.as_u32() as i32)
        } else {
            1.0
        };

        let (n, k) = match self.order {
            GaussianOrder::Zero => {
                let n = series.numerator(s);
                let (sn, _, _) = moments(&n);
                let alpha = 2.0 * sn / sd - n[0];
                (n, 1.0 / alpha)
            }
            GaussianOrder::First => {
                let n = series.numerator(s);
                let (sn, dn, _) = moments(&n);
                let alpha = 2.0 * (sn * dd - dn * sd) / (sd * sd);
                (n, scale / (alpha * spacing))
            }
            GaussianOrder::Second => {
                // cancel the response to a constant with the smoothing series
                let n0 = ExponentialSeries::deriche(GaussianOrder::Zero).numerator(s);
                let n2 = series.numerator(s);
                let (sn0, _, _) = moments(&n0);
                let (sn2, _, _) = moments(&n2);
                let beta = -(2.0 * sn2 - sd * n2[0]) / (2.0 * sn0 - sd * n0[0]);

                let n: [f64; 4] = std::array::from_fn(|i| n2[i] + beta * n0[i]);
                let (sn, dn, en) = moments(&n);
                let alpha = (en * sd * sd - ed * sn * sd - 2.0 * dn * dd * sd
                    + 2.0 * dd * dd * sn)
                    / (sd * sd * sd);
                (n, scale / (alpha * spacing * spacing))
            }
        };

        Ok(RecursiveCoefficients::from_causal(n, d, k, self.symmetry()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn filter(
        kernel: RecursiveGaussian,
        spacing: f64,
        data: &[f64],
    ) -> Result<Vec<f64>, FilterError> {
        let coefficients = kernel.set_up(spacing)?;
        let mut outs = vec![0.0; data.len()];
        coefficients.filter_data_array(&mut outs, data);
        Ok(outs)
    }

    #[test]
    fn test_moments() {
        assert_eq!(moments(&[1.0, 2.0, 3.0, 4.0]), (10.0, 20.0, 50.0));
        assert_eq!(moments(&[1.0, 1.0, 2.0, 3.0, 4.0]), (11.0, 30.0, 100.0));
    }

    #[test]
    fn test_constant_preserved() -> Result<(), FilterError> {
        for len in [1, 3, 10, 64] {
            let out = filter(RecursiveGaussian::new(2.0), 1.0, &vec![7.0; len])?;
            for v in out {
                assert_relative_eq!(v, 7.0, epsilon = 1e-9);
            }
        }
        Ok(())
    }

    #[test]
    fn test_impulse_response() -> Result<(), FilterError> {
        let mut impulse = vec![0.0; 41];
        impulse[20] = 1.0;
        let out = filter(RecursiveGaussian::new(2.0), 1.0, &impulse)?;

        assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-5);
        let peak = 1.0 / (2.0 * std::f64::consts::PI * 4.0).sqrt();
        assert_relative_eq!(out[20], peak, max_relative = 0.02);
        for i in 0..20 {
            assert_relative_eq!(out[20 - i], out[20 + i], epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_first_derivative_of_ramp() -> Result<(), FilterError> {
        let ramp: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let kernel = RecursiveGaussian::new(2.0).with_order(GaussianOrder::First);

        let out = filter(kernel, 1.0, &ramp)?;
        for &v in &out[15..25] {
            assert_relative_eq!(v, 1.0, epsilon = 1e-3);
        }

        // samples half a unit apart: the slope per unit doubles
        let out = filter(kernel, 0.5, &ramp)?;
        for &v in &out[15..25] {
            assert_relative_eq!(v, 2.0, epsilon = 1e-2);
        }
        Ok(())
    }

    #[test]
    fn test_first_derivative_antisymmetric() -> Result<(), FilterError> {
        let mut impulse = vec![0.0; 41];
        impulse[20] = 1.0;
        let kernel = RecursiveGaussian::new(2.0).with_order(GaussianOrder::First);
        let out = filter(kernel, 1.0, &impulse)?;

        assert_relative_eq!(out[20], 0.0, epsilon = 1e-12);
        for i in 1..20 {
            assert_relative_eq!(out[20 - i], -out[20 + i], epsilon = 1e-12);
        }
        // convolution: the response after the impulse is negative
        assert!(out[21] < 0.0);
        Ok(())
    }

    #[test]
    fn test_second_derivative_of_parabola() -> Result<(), FilterError> {
        let parabola: Vec<f64> = (0..60).map(|i| (i * i) as f64 / 2.0).collect();
        let kernel = RecursiveGaussian::new(3.0).with_order(GaussianOrder::Second);
        let out = filter(kernel, 1.0, &parabola)?;
        for &v in &out[25..35] {
            assert_relative_eq!(v, 1.0, epsilon = 1e-3);
        }

        let constant = filter(kernel, 1.0, &[4.0; 16])?;
        for v in constant {
            assert_relative_eq!(v, 0.0, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_normalize_across_scale() -> Result<(), FilterError> {
        let kernel = RecursiveGaussian::new(3.0).with_order(GaussianOrder::Second);
        let raw = kernel.set_up(1.0)?;
        let normalized = kernel.with_normalize_across_scale(true).set_up(1.0)?;
        assert_relative_eq!(normalized.k, 9.0 * raw.k, max_relative = 1e-12);
        assert_eq!(normalized.n, raw.n);
        Ok(())
    }

    #[test]
    fn test_symmetry() {
        let kernel = RecursiveGaussian::default();
        assert_eq!(kernel.symmetry(), Symmetry::Symmetric);
        assert_eq!(
            kernel.with_order(GaussianOrder::First).symmetry(),
            Symmetry::Antisymmetric
        );
        assert_eq!(
            kernel.with_order(GaussianOrder::Second).symmetry(),
            Symmetry::Symmetric
        );
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            RecursiveGaussian::new(0.0).set_up(1.0),
            Err(FilterError::InvalidSigma(0.0))
        );
        assert_eq!(
            RecursiveGaussian::new(1.0).set_up(-2.0),
            Err(FilterError::InvalidSpacing(-2.0))
        );
        assert!(RecursiveGaussian::new(f64::NAN).set_up(1.0).is_err());
    }
}
