//! Channel selectors and owned (x, y) series handed to plotting callers.

use esr_io::RawSamples;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four y channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Real,
    RealNormalized,
    Imaginary,
    ImaginaryNormalized,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Real,
        Channel::RealNormalized,
        Channel::Imaginary,
        Channel::ImaginaryNormalized,
    ];

    /// Select by the legacy `(is_norm, is_imag)` flag pair.
    pub fn from_flags(is_norm: bool, is_imag: bool) -> Self {
        match (is_norm, is_imag) {
            (false, false) => Channel::Real,
            (true, false) => Channel::RealNormalized,
            (false, true) => Channel::Imaginary,
            (true, true) => Channel::ImaginaryNormalized,
        }
    }

    pub fn is_normalized(self) -> bool {
        matches!(self, Channel::RealNormalized | Channel::ImaginaryNormalized)
    }

    pub fn is_imaginary(self) -> bool {
        matches!(self, Channel::Imaginary | Channel::ImaginaryNormalized)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Real => write!(f, "real"),
            Channel::RealNormalized => write!(f, "real (normalized)"),
            Channel::Imaginary => write!(f, "imaginary"),
            Channel::ImaginaryNormalized => write!(f, "imaginary (normalized)"),
        }
    }
}

/// Lifecycle stage of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Raw,
    Reduced,
    Integrated,
}

/// x plus the four y channels at one stage. The imaginary pair is either
/// empty or as long as `x`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    pub x: Vec<f64>,
    pub real: Vec<f64>,
    pub real_norm: Vec<f64>,
    pub imag: Vec<f64>,
    pub imag_norm: Vec<f64>,
}

impl Channels {
    pub fn y(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Real => &self.real,
            Channel::RealNormalized => &self.real_norm,
            Channel::Imaginary => &self.imag,
            Channel::ImaginaryNormalized => &self.imag_norm,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Owned copy of `(x, y(channel))`.
    pub fn series(&self, channel: Channel) -> XySeries {
        let y = self.y(channel);
        if y.is_empty() {
            return XySeries::default();
        }
        XySeries::new(self.x.clone(), y.to_vec())
    }
}

impl From<RawSamples> for Channels {
    fn from(s: RawSamples) -> Self {
        Self {
            x: s.x,
            real: s.real,
            real_norm: s.real_norm,
            imag: s.imag,
            imag_norm: s.imag_norm,
        }
    }
}

impl From<&Channels> for RawSamples {
    fn from(c: &Channels) -> Self {
        RawSamples {
            x: c.x.clone(),
            real: c.real.clone(),
            real_norm: c.real_norm.clone(),
            imag: c.imag.clone(),
            imag_norm: c.imag_norm.clone(),
        }
    }
}

/// Owned parallel `(x, y)` arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XySeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl XySeries {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn last(&self) -> Option<f64> {
        self.y.last().copied()
    }

    /// Sum of all y values.
    pub fn sum(&self) -> f64 {
        self.y.iter().sum()
    }
}

/// Integrated series for the four channels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratedChannels {
    pub real: XySeries,
    pub real_norm: XySeries,
    pub imag: XySeries,
    pub imag_norm: XySeries,
}

impl IntegratedChannels {
    pub fn get(&self, channel: Channel) -> &XySeries {
        match channel {
            Channel::Real => &self.real,
            Channel::RealNormalized => &self.real_norm,
            Channel::Imaginary => &self.imag,
            Channel::ImaginaryNormalized => &self.imag_norm,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut XySeries {
        match channel {
            Channel::Real => &mut self.real,
            Channel::RealNormalized => &mut self.real_norm,
            Channel::Imaginary => &mut self.imag,
            Channel::ImaginaryNormalized => &mut self.imag_norm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_flags() {
        for ch in Channel::ALL {
            assert_eq!(Channel::from_flags(ch.is_normalized(), ch.is_imaginary()), ch);
        }
    }

    #[test]
    fn test_series_is_an_owned_copy() {
        let mut c = Channels {
            x: vec![0.0, 1.0],
            real: vec![1.0, 2.0],
            real_norm: vec![0.5, 1.0],
            ..Default::default()
        };
        let s = c.series(Channel::Real);
        c.real[0] = 99.0;
        assert_eq!(s.y, vec![1.0, 2.0]);
        assert_eq!(s.points().collect::<Vec<_>>(), vec![(0.0, 1.0), (1.0, 2.0)]);
        assert!(c.series(Channel::Imaginary).is_empty());
    }
}
