//! Trapezoidal cumulative integration over an x window.

use crate::data::series::XySeries;
use esr_io::EsrWarning;
use serde::{Deserialize, Serialize};

/// Integration window with an optional explicit integration constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationWindow {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub constant: Option<f64>,
}

impl IntegrationWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            constant: None,
        }
    }

    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Same window with `start <= end`.
    pub fn ordered(self) -> Self {
        if self.start > self.end {
            log::warn!("start > end, swapping them");
            Self {
                start: self.end,
                end: self.start,
                constant: self.constant,
            }
        } else {
            self
        }
    }

    /// Order the window, then require it inside `(min, max)`.
    pub fn check_bounds(self, (min, max): (f64, f64)) -> Result<Self, EsrWarning> {
        let w = self.ordered();
        if w.start < min || w.end > max {
            return Err(EsrWarning::IntegrationRangeOutOfBounds {
                start: w.start,
                end: w.end,
                min,
                max,
            });
        }
        Ok(w)
    }
}

/// Cumulative trapezoid of `ys` over `xs`, restricted to `window`.
///
/// The point just before the first in-range x seeds the sum, with either
/// the window constant or its own y value. Mismatched lengths give an
/// empty series.
pub fn trapezoid_cumulative(xs: &[f64], ys: &[f64], window: &IntegrationWindow) -> XySeries {
    if xs.len() != ys.len() {
        log::warn!(
            "data size inconsistent: x_size={} <-> y_size={}",
            xs.len(),
            ys.len()
        );
        return XySeries::default();
    }
    let w = window.ordered();

    let mut out_x = Vec::with_capacity(xs.len());
    let mut out_y = Vec::with_capacity(ys.len());
    let mut sum = 0.0;
    for i in 1..xs.len() {
        let x = xs[i];
        if x < w.start || x > w.end {
            continue;
        }
        if out_x.is_empty() {
            sum = w.constant.unwrap_or(ys[i - 1]);
            out_x.push(xs[i - 1]);
            out_y.push(sum);
        }
        sum += 0.5 * (ys[i] + ys[i - 1]) * (xs[i] - xs[i - 1]);
        out_x.push(x);
        out_y.push(sum);
    }
    XySeries::new(out_x, out_y)
}
