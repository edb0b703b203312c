//! Load failures, and the non-fatal warnings raised while loading, reducing
//! and integrating.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// A failure that leaves no usable dataset behind.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    UnreadableStream(#[from] io::Error),
    #[error("Unrecognized file format")]
    UnrecognizedFormat,
    #[error("Malformed sample on line {line_number}: \"{raw_text}\"")]
    MalformedSample { line_number: usize, raw_text: String },
    #[error("Data truncated: expected {expected} samples, got {got}")]
    TruncatedStream { expected: usize, got: usize },
    #[error("Archive has no \"{0}\" record stream")]
    ArchiveStructureMissing(String),
    #[error("Malformed archive: {0}")]
    MalformedArchive(String),
}

/// A problem that was corrected in place; analysis continues.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EsrWarning {
    #[error("header field \"{key}\" is missing, using default")]
    HeaderFieldMissing { key: String },
    #[error("data length {data_length} differs from descriptor length {descriptor_length}")]
    LengthMismatch {
        data_length: i64,
        descriptor_length: i64,
    },
    #[error("x range width {width} is negative")]
    NegativeXRange { width: f64 },
    #[error("gain is zero, normalized channels are not finite")]
    ZeroGain,
    #[error("reduction factor {requested} is invalid, using {applied}")]
    InvalidReductionFactor { requested: i64, applied: i64 },
    #[error("integration range [{start}, {end}] is outside [{min}, {max}]")]
    IntegrationRangeOutOfBounds {
        start: f64,
        end: f64,
        min: f64,
        max: f64,
    },
}

impl EsrWarning {
    /// Log the warning and append it to `sink`.
    pub fn report(self, sink: &mut Vec<EsrWarning>) {
        log::warn!("{}", self);
        sink.push(self);
    }
}
