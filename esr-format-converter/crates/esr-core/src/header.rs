//! `StructuredHeader`: the five typed sub-records derived from a raw header.

use crate::elements::{
    AcquisitionParameters, DataHead, ElementKind, EsrDataDescriptor, FineCoarse,
    GeneralParameters, HeaderElement, SpectrometerParameters,
};
use crate::enums::AmplitudeKind;
use crate::raw::RawHeader;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys every complete header should carry. Missing ones are reported but
/// never fatal; the typed value falls back to zero.
pub const MANDATORY_KEYS: &[&str] = &[
    "data length",
    "x-range min",
    "x-range",
    "amplitude(fine)",
    "amplitude(coarse)",
];

/// Keys from `wanted` that `raw` does not contain, in `wanted` order.
pub fn missing_keys<'a>(raw: &RawHeader, wanted: &[&'a str]) -> Vec<&'a str> {
    wanted
        .iter()
        .copied()
        .filter(|k| !raw.contains_key(k))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredHeader {
    pub data_head: DataHead,
    pub general: GeneralParameters,
    pub spectrometer: SpectrometerParameters,
    pub acquisition: AcquisitionParameters,
    pub descriptor: EsrDataDescriptor,
}

impl From<&RawHeader> for StructuredHeader {
    fn from(raw: &RawHeader) -> Self {
        Self {
            data_head: DataHead::from_raw_header(raw),
            general: GeneralParameters::from_raw_header(raw),
            spectrometer: SpectrometerParameters::from_raw_header(raw),
            acquisition: AcquisitionParameters::from_raw_header(raw),
            descriptor: EsrDataDescriptor::from_raw_header(raw),
        }
    }
}

impl StructuredHeader {
    pub fn data_length(&self) -> i64 {
        self.data_head.data_length
    }

    pub fn date(&self) -> &str {
        &self.general.date
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.data_head.x_range()
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.data_head.y_range()
    }

    /// Overwrite the x range; used when the range is taken from the data.
    pub fn set_x_range(&mut self, (min, max): (f64, f64)) {
        self.data_head.x_range_min = min;
        self.data_head.x_range_width = max - min;
    }

    pub fn amplitude(&self, kind: AmplitudeKind) -> FineCoarse {
        self.spectrometer.amplitude(kind)
    }

    pub fn set_amplitude(&mut self, value: FineCoarse, kind: AmplitudeKind) {
        self.spectrometer.set_amplitude(value, kind);
    }

    pub fn gain(&self) -> f64 {
        self.spectrometer.gain()
    }

    /// `Some((data_length, descriptor_length))` when the two disagree.
    pub fn length_mismatch(&self) -> Option<(i64, i64)> {
        let dl = self.data_head.data_length;
        let el = self.descriptor.length;
        (dl != el).then_some((dl, el))
    }

    /// Owned copies of the five sub-records, in file order.
    pub fn elements(&self) -> Vec<HeaderElement> {
        vec![
            HeaderElement::DataHead(self.data_head.clone()),
            HeaderElement::GeneralParameters(self.general.clone()),
            HeaderElement::SpectrometerParameters(self.spectrometer.clone()),
            HeaderElement::AcquisitionParameters(self.acquisition.clone()),
            HeaderElement::EsrDataDescriptor(self.descriptor),
        ]
    }
}

impl fmt::Display for StructuredHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, element) in ElementKind::ALL.iter().zip(self.elements()) {
            writeln!(f, "── {} ──", kind.section_title())?;
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}
