//! Typed views over a [`RawHeader`]: the five header sub-records.
//!
//! Each record has its own `from_raw_header` constructor; [`HeaderElement`]
//! wraps them when a caller needs to treat the five uniformly (printing,
//! iteration). Key strings match the spelling used by the instrument
//! exports, including their abbreviations (`sweep width(coar)`,
//! `amplitude2(coars)`).

use crate::raw::{clean_field, RawHeader};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date layout used by every export once `~` separators are removed.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Room temperature in kelvin, used when the file records `RT`.
pub const ROOM_TEMPERATURE_K: f64 = 300.0;

/// A `(fine, coarse)` setting. Coarse values are base-10 exponents.
pub type FineCoarse = (f64, f64);

/// `fine × 10^coarse`.
pub fn fine_coarse_value(v: FineCoarse) -> f64 {
    v.0 * 10f64.powf(v.1)
}

// ─── Data Head ──────────────────────────────────────────────────────────────

/// Lengths, ranges, and units of the stored sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataHead {
    pub file_name: String,
    pub data_number: i64,
    pub data_length: i64,
    pub data_sort: String,
    pub x_range_min: f64,
    pub x_range_width: f64,
    pub x_unit: String,
    pub min_max_value: (f64, f64),
    pub y_unit: String,
    pub x_view: (f64, f64),
    pub y_view: (f64, f64),
    pub data_type: String,
}

impl DataHead {
    pub fn from_raw_header(raw: &RawHeader) -> Self {
        Self {
            file_name: raw.text("file name"),
            data_number: raw.int("data number"),
            data_length: raw.int("data length"),
            data_sort: raw.text("data sort"),
            x_range_min: raw.float("x-range min"),
            x_range_width: raw.float("x-range"),
            x_unit: raw.text("x unit"),
            min_max_value: (raw.float("min value"), raw.float("max value")),
            y_unit: raw.text("y unit"),
            x_view: (raw.float("x-view min"), raw.float("x-view max")),
            y_view: (raw.float("y-view min"), raw.float("y-view max")),
            data_type: raw.text("type"),
        }
    }

    /// `(x_range_min, x_range_min + x_range_width)`.
    pub fn x_range(&self) -> (f64, f64) {
        (self.x_range_min, self.x_range_min + self.x_range_width)
    }

    /// Recorded y view window.
    pub fn y_range(&self) -> (f64, f64) {
        self.y_view
    }

    /// A negative width marks a malformed file.
    pub fn is_well_formed(&self) -> bool {
        self.x_range_width >= 0.0
    }
}

impl fmt::Display for DataHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data length: {}", self.data_length)?;
        writeln!(
            f,
            "x range min/x range: {} / {}",
            self.x_range_min, self.x_range_width
        )?;
        writeln!(f, "x view: {}, {}", self.x_view.0, self.x_view.1)?;
        writeln!(f, "y view: {}, {}", self.y_view.0, self.y_view.1)
    }
}

// ─── General Parameters ─────────────────────────────────────────────────────

/// Title, sample, and provenance strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralParameters {
    pub title: String,
    pub sample_name: String,
    pub comment: String,
    pub system_name: String,
    pub version: String,
    pub date: String,
    pub origin_file: String,
    pub prev_file: String,
}

impl GeneralParameters {
    pub fn from_raw_header(raw: &RawHeader) -> Self {
        Self {
            title: raw.text("title"),
            sample_name: raw.text("sample name"),
            comment: raw.text("comment"),
            system_name: raw.text("system name"),
            version: raw.text("version"),
            date: raw.text("date"),
            origin_file: raw.text("origin file"),
            prev_file: raw.text("prev. file"),
        }
    }

    /// Acquisition date parsed with [`DATE_FORMAT`].
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let cleaned = clean_field(&self.date);
        match NaiveDateTime::parse_from_str(&cleaned, DATE_FORMAT) {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!(
                    "failed to parse date \"{}\" as \"{}\": {}",
                    self.date,
                    DATE_FORMAT,
                    e
                );
                None
            }
        }
    }
}

impl fmt::Display for GeneralParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "title: {}", self.title)?;
        writeln!(f, "sample: {}", self.sample_name)?;
        writeln!(f, "date: {}", self.date)
    }
}

// ─── Spectrometer Parameters ────────────────────────────────────────────────

/// Field sweep and lock-in settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub control: String,
    pub time: f64,
    pub width: FineCoarse,
    pub mod_freq: f64,
    pub phase: FineCoarse,
    pub phase2: FineCoarse,
    pub mod_width: FineCoarse,
    pub amplitude1: FineCoarse,
    pub amplitude2: FineCoarse,
    pub time_constant1: f64,
    pub time_constant2: f64,
}

/// Microwave bridge settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicroWave {
    pub freq: f64,
    pub freq_unit: String,
    pub power: f64,
    pub power_unit: String,
    pub phase: i64,
    pub coupling: i64,
    pub is_30db: bool,
    pub is_ref: bool,
    pub is_gunp: bool,
}

impl MicroWave {
    /// Frequency converted to MHz. Unknown units are taken as MHz.
    pub fn frequency_mhz(&self) -> f64 {
        match self.freq_unit.as_str() {
            "kHz" => self.freq / 1.0e3,
            "GHz" => self.freq * 1.0e3,
            _ => self.freq,
        }
    }

    /// Power converted to mW. Unknown units are taken as mW.
    pub fn power_mw(&self) -> f64 {
        match self.power_unit.as_str() {
            "W" => self.power * 1.0e3,
            "uW" => self.power / 1.0e3,
            _ => self.power,
        }
    }
}

/// Variable-temperature unit state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub vt_type: String,
    pub controlled: bool,
    pub value: f64,
    pub unit: String,
}

impl Default for Temperature {
    fn default() -> Self {
        Self {
            vt_type: String::new(),
            controlled: false,
            value: ROOM_TEMPERATURE_K,
            unit: String::new(),
        }
    }
}

/// Sweep, microwave, and temperature settings of the spectrometer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectrometerParameters {
    pub center_field: f64,
    pub zero: i64,
    pub zero2: i64,
    pub receiver_mode: String,
    pub receiver_mode2: String,
    pub reserved_area: String,
    pub sweep: Sweep,
    pub microwave: MicroWave,
    pub temperature: Temperature,
}

impl SpectrometerParameters {
    pub fn from_raw_header(raw: &RawHeader) -> Self {
        let pair = |fine: &str, coarse: &str| (raw.mnemonic_float(fine), raw.mnemonic_float(coarse));
        let on = |key: &str| raw.mnemonic_text(key) == "on";

        let sweep = Sweep {
            control: raw.mnemonic_text("sweep control"),
            time: raw.mnemonic_float("sweep time"),
            width: pair("sweep width(fine)", "sweep width(coar)"),
            mod_freq: raw.mnemonic_float("modulation freq."),
            phase: pair("phase", "phase (fine)"),
            phase2: (raw.mnemonic_float("phase2 (fine)"), 0.0),
            mod_width: pair("mod. width(fine)", "mod. width(coarse)"),
            amplitude1: pair("amplitude(fine)", "amplitude(coarse)"),
            amplitude2: pair("amplitude2(fine)", "amplitude2(coars)"),
            time_constant1: raw.mnemonic_float("time constant"),
            time_constant2: raw.mnemonic_float("time constant2"),
        };

        let microwave = MicroWave {
            freq: raw.mnemonic_float("micro frequency"),
            freq_unit: raw.mnemonic_text("micro freq. unit"),
            power: raw.mnemonic_float("micro power"),
            power_unit: raw.mnemonic_text("micro power unit"),
            phase: raw.mnemonic_int("micro phase"),
            coupling: raw.mnemonic_int("micro coupling"),
            is_30db: on("micro 30db"),
            is_ref: on("micro ref"),
            is_gunp: on("micro gunp"),
        };

        let raw_temperature = raw.text("temperature");
        let temperature = Temperature {
            vt_type: raw.text("vt type"),
            controlled: raw.text("temp. control") == "on",
            value: if raw_temperature.contains("RT") {
                ROOM_TEMPERATURE_K
            } else {
                raw.float("temperature")
            },
            unit: raw.text("temperature unit"),
        };

        Self {
            center_field: raw.mnemonic_float("center field"),
            zero: raw.mnemonic_int("zero"),
            zero2: raw.mnemonic_int("zero2"),
            receiver_mode: raw.text("receiver mode"),
            receiver_mode2: raw.text("receiver mode2"),
            reserved_area: raw.text("reserved area"),
            sweep,
            microwave,
            temperature,
        }
    }

    /// Receiver amplitude setting `(fine, coarse)`.
    pub fn amplitude(&self, kind: crate::AmplitudeKind) -> FineCoarse {
        match kind {
            crate::AmplitudeKind::Primary => self.sweep.amplitude1,
            crate::AmplitudeKind::Secondary => self.sweep.amplitude2,
        }
    }

    pub fn set_amplitude(&mut self, value: FineCoarse, kind: crate::AmplitudeKind) {
        match kind {
            crate::AmplitudeKind::Primary => self.sweep.amplitude1 = value,
            crate::AmplitudeKind::Secondary => self.sweep.amplitude2 = value,
        }
    }

    /// Normalisation divisor: `amplitude_fine × 10^amplitude_coarse`.
    ///
    /// Zero when the amplitude is missing; dividing by it then yields
    /// IEEE-754 infinities or NaN.
    pub fn gain(&self) -> f64 {
        fine_coarse_value(self.sweep.amplitude1)
    }
}

impl fmt::Display for SpectrometerParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sw = &self.sweep;
        let mw = &self.microwave;
        let t = &self.temperature;
        writeln!(f, "Sweep")?;
        writeln!(f, "* time: {}", sw.time)?;
        writeln!(f, "* width: {}, {}", sw.width.0, sw.width.1)?;
        writeln!(f, "* amp: {} x 10^{}", sw.amplitude1.0, sw.amplitude1.1)?;
        writeln!(f, "* time constant: {}", sw.time_constant1)?;
        writeln!(f, "Microwave")?;
        writeln!(f, "* frequency: {} {}", mw.freq, mw.freq_unit)?;
        writeln!(f, "* power: {} {}", mw.power, mw.power_unit)?;
        writeln!(f, "Temperature")?;
        writeln!(f, "* control is on? {}", t.controlled)?;
        writeln!(f, "* temperature: {} {}", t.value, t.unit)
    }
}

// ─── Acquisition Parameters ─────────────────────────────────────────────────

/// Accumulation and sampling settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionParameters {
    pub accumulation_count: i64,
    pub delay_time: i64,
    pub interval_time: i64,
    pub reserved_int: i64,
    pub sampling_time: i64,
    pub reserved_float: f64,
    pub accumulation_mode: String,
    pub baseline: String,
    pub sampling_mode: String,
    pub signal_trigger: String,
    pub reference_file_name: String,
    pub reserved_char: String,
}

impl AcquisitionParameters {
    pub fn from_raw_header(raw: &RawHeader) -> Self {
        Self {
            accumulation_count: raw.int("accumulation count"),
            delay_time: raw.int("delay time"),
            interval_time: raw.int("interval time"),
            reserved_int: raw.int("reserved(int)"),
            sampling_time: raw.int("sampling time"),
            reserved_float: raw.float("reserved(float)"),
            accumulation_mode: raw.text("accumulation mode"),
            baseline: raw.text("baseline"),
            sampling_mode: raw.text("sampling mode"),
            signal_trigger: raw.text("signal trigger"),
            reference_file_name: raw.text("reference file name"),
            reserved_char: raw.text("reserved(char)"),
        }
    }
}

impl fmt::Display for AcquisitionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "accumulation count: {}", self.accumulation_count)?;
        writeln!(f, "sampling time: {}", self.sampling_time)
    }
}

// ─── ESR Data descriptor ────────────────────────────────────────────────────

/// Length recorded in the data section; should equal `DataHead::data_length`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EsrDataDescriptor {
    pub length: i64,
}

impl EsrDataDescriptor {
    pub fn from_raw_header(raw: &RawHeader) -> Self {
        Self {
            length: raw.int("length"),
        }
    }
}

impl fmt::Display for EsrDataDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "length: {}", self.length)
    }
}

// ─── Sum type ───────────────────────────────────────────────────────────────

/// Selector for [`HeaderElement::from_raw_header`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    DataHead,
    GeneralParameters,
    SpectrometerParameters,
    AcquisitionParameters,
    EsrDataDescriptor,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::DataHead,
        ElementKind::GeneralParameters,
        ElementKind::SpectrometerParameters,
        ElementKind::AcquisitionParameters,
        ElementKind::EsrDataDescriptor,
    ];

    /// Section title as printed in the annotated text export.
    pub fn section_title(self) -> &'static str {
        match self {
            Self::DataHead => "Data Head",
            Self::GeneralParameters => "General Parameters",
            Self::SpectrometerParameters => "Spectrometer Parameters",
            Self::AcquisitionParameters => "Acquisition Parameters",
            Self::EsrDataDescriptor => "Esr Data",
        }
    }
}

/// One of the five typed header sub-records.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderElement {
    DataHead(DataHead),
    GeneralParameters(GeneralParameters),
    SpectrometerParameters(SpectrometerParameters),
    AcquisitionParameters(AcquisitionParameters),
    EsrDataDescriptor(EsrDataDescriptor),
}

impl HeaderElement {
    pub fn from_raw_header(kind: ElementKind, raw: &RawHeader) -> Self {
        match kind {
            ElementKind::DataHead => Self::DataHead(DataHead::from_raw_header(raw)),
            ElementKind::GeneralParameters => {
                Self::GeneralParameters(GeneralParameters::from_raw_header(raw))
            }
            ElementKind::SpectrometerParameters => {
                Self::SpectrometerParameters(SpectrometerParameters::from_raw_header(raw))
            }
            ElementKind::AcquisitionParameters => {
                Self::AcquisitionParameters(AcquisitionParameters::from_raw_header(raw))
            }
            ElementKind::EsrDataDescriptor => {
                Self::EsrDataDescriptor(EsrDataDescriptor::from_raw_header(raw))
            }
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::DataHead(_) => ElementKind::DataHead,
            Self::GeneralParameters(_) => ElementKind::GeneralParameters,
            Self::SpectrometerParameters(_) => ElementKind::SpectrometerParameters,
            Self::AcquisitionParameters(_) => ElementKind::AcquisitionParameters,
            Self::EsrDataDescriptor(_) => ElementKind::EsrDataDescriptor,
        }
    }
}

impl fmt::Display for HeaderElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataHead(e) => e.fmt(f),
            Self::GeneralParameters(e) => e.fmt(f),
            Self::SpectrometerParameters(e) => e.fmt(f),
            Self::AcquisitionParameters(e) => e.fmt(f),
            Self::EsrDataDescriptor(e) => e.fmt(f),
        }
    }
}
