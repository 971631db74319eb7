use crate::filter::LineFilter;
use crate::Real;

/// Parity of a recursive filter response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symmetry {
    /// Even response, e.g. the Gaussian and its second derivative.
    Symmetric,
    /// Odd response, e.g. the first derivative.
    Antisymmetric,
}

/// Coefficients of a two pass recursive line filter.
///
/// The causal pass computes
/// `y[i] = sum_k n[k] x[i - k] - sum_k d[k] y[i - 1 - k]` and the anti-causal
/// pass `z[i] = sum_k m[k] x[i + 1 + k] - sum_k d[k] z[i + 1 + k]`. The output
/// is `k * (y + z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecursiveCoefficients<R> {
    /// Causal numerator.
    pub n: [R; 4],
    /// Denominator shared by both passes.
    pub d: [R; 4],
    /// Anti-causal numerator.
    pub m: [R; 4],
    /// Normalization applied to the sum of both passes.
    pub k: R,
    /// Response of the causal pass to a unit constant.
    pub causal_gain: R,
    /// Response of the anti-causal pass to a unit constant.
    pub anticausal_gain: R,
    /// Parity the anti-causal numerator was derived for.
    pub symmetry: Symmetry,
}

impl RecursiveCoefficients<f64> {
    /// Derive the anti-causal numerator and the edge gains from the causal
    /// numerator `n` and denominator `d`.
    ///
    /// For a symmetric response `m[j] = n[j + 1] - d[j] n[0]` (with
    /// `n[4] = 0`); an antisymmetric response flips the sign.
    pub fn from_causal(n: [f64; 4], d: [f64; 4], k: f64, symmetry: Symmetry) -> Self {
        let mut m = [
            n[1] - d[0] * n[0],
            n[2] - d[1] * n[0],
            n[3] - d[2] * n[0],
            -d[3] * n[0],
        ];
        if symmetry == Symmetry::Antisymmetric {
            m.iter_mut().for_each(|c| *c = -*c);
        }

        let denominator = 1.0 + d.iter().sum::<f64>();
        Self {
            n,
            d,
            m,
            k,
            causal_gain: n.iter().sum::<f64>() / denominator,
            anticausal_gain: m.iter().sum::<f64>() / denominator,
            symmetry,
        }
    }

    /// Convert to the computation precision `R`.
    pub fn to_precision<R: Real>(&self) -> RecursiveCoefficients<R> {
        let convert = |c: [f64; 4]| c.map(R::from_real);
        RecursiveCoefficients {
            n: convert(self.n),
            d: convert(self.d),
            m: convert(self.m),
            k: R::from_real(self.k),
            causal_gain: R::from_real(self.causal_gain),
            anticausal_gain: R::from_real(self.anticausal_gain),
            symmetry: self.symmetry,
        }
    }
}

impl<R: Real> RecursiveCoefficients<R> {
    /// Filter one line of samples.
    ///
    /// Inputs before the first and after the last sample repeat the edge
    /// value, and the recurrence history starts at the steady state response
    /// to that constant, so a constant line maps to `k * (causal_gain +
    /// anticausal_gain)` times itself. On a length mismatch only the common
    /// prefix of `outs` and `data` is filtered.
    pub fn filter_data_array(&self, outs: &mut [R], data: &[R]) {
        let len = outs.len().min(data.len());
        let (outs, data) = (&mut outs[..len], &data[..len]);
        let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
            return;
        };
        let end = data.len() - 1;
        let [n0, n1, n2, n3] = self.n;
        let [d1, d2, d3, d4] = self.d;
        let [m1, m2, m3, m4] = self.m;

        // causal
        let edge = first * self.causal_gain;
        let (mut y1, mut y2, mut y3, mut y4) = (edge, edge, edge, edge);
        for (i, out) in outs.iter_mut().enumerate() {
            let x = |k: usize| data[i.saturating_sub(k)];
            let y = n0 * x(0) + n1 * x(1) + n2 * x(2) + n3 * x(3)
                - (d1 * y1 + d2 * y2 + d3 * y3 + d4 * y4);
            (y4, y3, y2, y1) = (y3, y2, y1, y);
            *out = y;
        }

        // anti-causal, combined in place
        let edge = last * self.anticausal_gain;
        let (mut z1, mut z2, mut z3, mut z4) = (edge, edge, edge, edge);
        for (i, out) in outs.iter_mut().enumerate().rev() {
            let x = |k: usize| data[(i + k).min(end)];
            let z = m1 * x(1) + m2 * x(2) + m3 * x(3) + m4 * x(4)
                - (d1 * z1 + d2 * z2 + d3 * z3 + d4 * z4);
            (z4, z3, z2, z1) = (z3, z2, z1, z);
            *out = self.k * (*out + z);
        }
    }
}

impl<R: Real> LineFilter<R> for RecursiveCoefficients<R> {
    fn filter_line(&self, output: &mut [R], input: &[R]) {
        self.filter_data_array(output, input);
    }
}
