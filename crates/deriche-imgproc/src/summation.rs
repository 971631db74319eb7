use std::ops::{AddAssign, SubAssign};

/// Running floating point sum with Neumaier (Kahan-Babuška) compensation.
///
/// The lost low-order bits of every addition are collected in a separate
/// term, so adding many values of very different magnitude keeps close to
/// full `f64` precision.
///
/// # Examples
///
/// ```rust
/// use deriche_imgproc::summation::CompensatedSum;
///
/// let mut acc = CompensatedSum::default();
/// acc += 1.0;
/// acc += 1e100;
/// acc += 1.0;
/// acc -= 1e100;
/// assert_eq!(acc.sum(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    /// Create an accumulator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compensated total.
    pub fn sum(&self) -> f64 {
        self.sum + self.compensation
    }

    /// Reset the accumulator to zero.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.compensation = 0.0;
    }

    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }
}

impl AddAssign<f64> for CompensatedSum {
    fn add_assign(&mut self, value: f64) {
        self.add(value);
    }
}

impl SubAssign<f64> for CompensatedSum {
    fn sub_assign(&mut self, value: f64) {
        self.add(-value);
    }
}

impl From<f64> for CompensatedSum {
    fn from(value: f64) -> Self {
        Self {
            sum: value,
            compensation: 0.0,
        }
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::default();
        for value in iter {
            acc += value;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation() {
        let acc: CompensatedSum = [1.0, 1e100, 1.0, -1e100].into_iter().collect();
        assert_eq!(acc.sum(), 2.0);

        let naive: f64 = [1.0, 1e100, 1.0, -1e100].iter().sum();
        assert_eq!(naive, 0.0);
    }

    #[test]
    fn test_many_small_terms() {
        let mut acc = CompensatedSum::from(1.0);
        let mut naive = 1.0;
        for _ in 0..1_000_000 {
            acc += 1e-16;
            naive += 1e-16;
        }
        assert_eq!(naive, 1.0);
        assert!((acc.sum() - (1.0 + 1e-10)).abs() < 1e-15);
    }

    #[test]
    fn test_sub_and_reset() {
        let mut acc = CompensatedSum::new();
        acc += 3.5;
        acc -= 1.25;
        assert_eq!(acc.sum(), 2.25);

        acc.reset();
        assert_eq!(acc.sum(), 0.0);
        assert_eq!(acc, CompensatedSum::default());
    }
}
