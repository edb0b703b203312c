//! Point-binning reduction.
//!
//! Consecutive raw samples are averaged in bins of `factor`; the final bin
//! may be partial and is averaged over the samples it actually holds.

use crate::data::series::Channels;
use esr_io::EsrWarning;

/// Corrected reduction factor for `data_length` samples.
///
/// Forces 1 for an empty dataset or a non-positive request, and clamps to
/// `data_length` otherwise. Returns a warning when the request changed.
pub fn check_reduction_factor(requested: i64, data_length: i64) -> (i64, Option<EsrWarning>) {
    let mut factor = requested;
    if data_length <= 0 {
        log::warn!("data length {} is invalid", data_length);
        factor = 1;
    }
    if factor <= 0 {
        factor = 1;
    }
    if data_length > 0 && factor > data_length {
        factor = data_length;
    }

    let warning = (factor != requested).then_some(EsrWarning::InvalidReductionFactor {
        requested,
        applied: factor,
    });
    (factor, warning)
}

/// Mean of every `factor` consecutive values; `factor` is at least 1.
pub fn reduce(values: &[f64], factor: usize) -> Vec<f64> {
    values
        .chunks(factor.max(1))
        .map(|bin| bin.iter().sum::<f64>() / bin.len() as f64)
        .collect()
}

/// Reduce x and all four y channels with the same bins.
pub fn reduce_channels(raw: &Channels, factor: usize) -> Channels {
    Channels {
        x: reduce(&raw.x, factor),
        real: reduce(&raw.real, factor),
        real_norm: reduce(&raw.real_norm, factor),
        imag: reduce(&raw.imag, factor),
        imag_norm: reduce(&raw.imag_norm, factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_factor_one_is_identity() {
        let v = vec![0.3, -1.2, 5.5, 7.0];
        assert_eq!(reduce(&v, 1), v);
    }

    #[test]
    fn test_reduced_length() {
        let n = 17;
        let v = ramp(n);
        for f in 1..=n {
            assert_eq!(reduce(&v, f).len(), (n + f - 1) / f, "factor {}", f);
        }
    }

    #[test]
    fn test_pairs_and_partial_bin() {
        assert_eq!(reduce(&ramp(10), 2), vec![0.5, 2.5, 4.5, 6.5, 8.5]);
        assert_eq!(reduce(&ramp(5), 2), vec![0.5, 2.5, 4.0]);
        assert!(reduce(&[], 3).is_empty());
    }

    #[test]
    fn test_check_reduction_factor() {
        assert_eq!(check_reduction_factor(4, 10), (4, None));
        assert_eq!(
            check_reduction_factor(0, 10),
            (
                1,
                Some(EsrWarning::InvalidReductionFactor {
                    requested: 0,
                    applied: 1
                })
            )
        );
        assert_eq!(check_reduction_factor(-3, 10).0, 1);
        assert_eq!(check_reduction_factor(25, 10).0, 10);
        assert_eq!(check_reduction_factor(5, 0).0, 1);
        assert_eq!(check_reduction_factor(5, -1).0, 1);
        assert_eq!(check_reduction_factor(1, 0), (1, None));
    }

    #[test]
    fn test_reduce_channels_keeps_empty_imaginary() {
        let raw = Channels {
            x: ramp(4),
            real: ramp(4),
            real_norm: ramp(4),
            ..Default::default()
        };
        let red = reduce_channels(&raw, 3);
        assert_eq!(red.x, vec![1.0, 3.0]);
        assert!(red.imag.is_empty());
        assert!(red.imag_norm.is_empty());
    }
}
