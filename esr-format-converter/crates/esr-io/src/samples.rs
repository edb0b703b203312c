//! Raw channel arrays produced by sample extraction.

use serde::{Deserialize, Serialize};

/// Upper bound on speculative pre-allocation from a header length.
pub(crate) const MAX_PREALLOC: usize = 1 << 20;

/// Raw channels as extracted from a file, plus their gain-normalized copies.
///
/// `x`, `real`, and `real_norm` always share one length. The imaginary
/// pair is either empty or the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSamples {
    pub x: Vec<f64>,
    pub real: Vec<f64>,
    pub real_norm: Vec<f64>,
    pub imag: Vec<f64>,
    pub imag_norm: Vec<f64>,
}

impl RawSamples {
    /// Build from extracted channels, dividing by `gain` for the normalized
    /// copies. A zero gain gives IEEE-754 infinities or NaN.
    pub fn from_channels(x: Vec<f64>, real: Vec<f64>, imag: Vec<f64>, gain: f64) -> Self {
        let real_norm = normalize(&real, gain);
        let imag_norm = normalize(&imag, gain);
        Self {
            x,
            real,
            real_norm,
            imag,
            imag_norm,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn has_imaginary(&self) -> bool {
        !self.imag.is_empty()
    }
}

/// `values[i] / gain`.
pub fn normalize(values: &[f64], gain: f64) -> Vec<f64> {
    values.iter().map(|v| v / gain).collect()
}

/// `x[i] = min + i * width / n`, for `i` in `0..n`.
pub fn synthesize_x(min: f64, width: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let dx = width / n as f64;
    (0..n).map(|i| min + i as f64 * dx).collect()
}

/// Header length as an element count; negative lengths count as zero.
pub(crate) fn sample_count(data_length: i64) -> usize {
    usize::try_from(data_length.max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_x() {
        assert_eq!(synthesize_x(0.0, 4.0, 4), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(synthesize_x(300.0, 10.0, 2), vec![300.0, 305.0]);
        assert!(synthesize_x(1.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_normalization() {
        let s = RawSamples::from_channels(vec![0.0, 1.0], vec![2.0, 4.0], vec![], 2.0);
        assert_eq!(s.real_norm, vec![1.0, 2.0]);
        assert!(s.imag_norm.is_empty());
        assert!(!s.has_imaginary());
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_zero_gain_is_not_finite() {
        let s = RawSamples::from_channels(
            vec![0.0, 1.0, 2.0],
            vec![1.0, -1.0, 0.0],
            vec![0.5, 0.0, 0.0],
            0.0,
        );
        assert_eq!(s.real_norm[0], f64::INFINITY);
        assert_eq!(s.real_norm[1], f64::NEG_INFINITY);
        assert!(s.real_norm[2].is_nan());
        assert!(s.imag_norm[1].is_nan());
    }

    #[test]
    fn test_sample_count() {
        assert_eq!(sample_count(-3), 0);
        assert_eq!(sample_count(12), 12);
    }
}
