//! Floating-point summation algorithms.
//!
//! The workhorse is the Kahan-Babushka-Neumaier (KBN) compensated sum,
//! [`neumaier_sum`]. It keeps a running sum plus a correction term that
//! collects the low-order bits lost by each addition, choosing which operand
//! was truncated by comparing magnitudes. Unlike classic Kahan summation it
//! stays accurate when an incoming term is larger than the running sum.
//!
//! [`naive_sum`] and [`kahan_sum`] are kept as baselines for accuracy
//! comparisons.

/// Incremental KBN accumulator.
///
/// Two accumulators built over disjoint parts of a sequence can be combined
/// with [`NeumaierSum::merge`], which is how the parallel reducers fold
/// per-thread results.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeumaierSum {
    sum: f64,
    compensation: f64,
}

impl NeumaierSum {
    /// Create an empty accumulator (value `0.0`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value.
    #[inline]
    pub fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            // Low-order bits of `value` were lost.
            self.compensation += (self.sum - t) + value;
        } else {
            // Low-order bits of `sum` were lost.
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    /// Fold another accumulator into this one.
    ///
    /// The other running sum is added with compensation; its correction term
    /// is carried over unchanged.
    #[inline]
    pub fn merge(&mut self, other: NeumaierSum) {
        self.add(other.sum);
        self.compensation += other.compensation;
    }

    /// The compensated total, `sum + compensation`.
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for NeumaierSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl FromIterator<f64> for NeumaierSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        acc.extend(iter);
        acc
    }
}

/// Kahan-Babushka-Neumaier compensated sum of `values`.
///
/// Returns `0.0` for an empty slice. The same function reduces raw vectors
/// and arrays of partial sums, so hierarchical reductions stay in the same
/// stability class as a flat one.
pub fn neumaier_sum(values: &[f64]) -> f64 {
    values.iter().copied().collect::<NeumaierSum>().value()
}

/// Plain left-to-right accumulation.
pub fn naive_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    for &v in values {
        sum += v;
    }
    sum
}

/// Classic Kahan compensated sum.
///
/// Fails when a term is much larger than the running sum, i.e. when
/// $\sum |x_i| \gg |\sum x_i|$.
pub fn kahan_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &v in values {
        let y = v - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    const ILL_CONDITIONED: [f64; 4] = [1.0, 1.0e16, -1.0e16, -0.5];

    #[test]
    fn test_empty_sum_is_zero() {
        assert_eq!(neumaier_sum(&[]), 0.0);
        assert_eq!(naive_sum(&[]), 0.0);
        assert_eq!(kahan_sum(&[]), 0.0);
    }

    #[test]
    fn test_neumaier_recovers_cancelled_terms() {
        assert_eq!(neumaier_sum(&ILL_CONDITIONED), 0.5);
    }

    #[test]
    fn test_naive_and_kahan_lose_cancelled_terms() {
        assert_eq!(naive_sum(&ILL_CONDITIONED), -0.5);
        assert_ne!(kahan_sum(&ILL_CONDITIONED), 0.5);
    }

    #[test]
    fn test_neumaier_repeated_tenth() {
        let data = vec![0.1_f64; 1000];
        let sum = neumaier_sum(&data);
        assert!((sum - 100.0).abs() < 1e-12, "sum = {sum}");
    }

    #[test]
    fn test_merge_matches_flat_sum() {
        let data: Vec<f64> = (0..1000).map(|i| 0.1 * i as f64 + 1e-3).collect();
        let (left, right) = data.split_at(377);
        let mut acc: NeumaierSum = left.iter().copied().collect();
        acc.merge(right.iter().copied().collect());
        assert!((acc.value() - neumaier_sum(&data)).abs() < 1e-9);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let mut acc: NeumaierSum = ILL_CONDITIONED.iter().copied().collect();
        acc.merge(NeumaierSum::new());
        assert_eq!(acc.value(), 0.5);
    }
}
