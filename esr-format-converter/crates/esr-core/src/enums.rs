//! Enumerations for ESR source layouts and amplitude selectors.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Source file layout ─────────────────────────────────────────────────────

/// Layout a dataset was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FileType {
    /// Annotated text export: 77 `key = value` lines, then one float per line.
    TextAnnotated,
    /// Two-column "wave" text export.
    WaveText,
    /// Structured archive re-export (`root` tag + big-endian version).
    Archive,
    /// Fixed-offset raw binary dump.
    RawBinary,
    /// Nothing matched, or the load failed.
    #[default]
    Unrecognized,
}

impl FileType {
    /// Legacy numeric tag: 0 text, 1 wave, 2 archive, 3 binary, -1 other.
    pub fn code(self) -> i32 {
        match self {
            Self::TextAnnotated => 0,
            Self::WaveText => 1,
            Self::Archive => 2,
            Self::RawBinary => 3,
            Self::Unrecognized => -1,
        }
    }

    pub fn from_code(v: i32) -> Self {
        match v {
            0 => Self::TextAnnotated,
            1 => Self::WaveText,
            2 => Self::Archive,
            3 => Self::RawBinary,
            _ => Self::Unrecognized,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextAnnotated => write!(f, "annotated text"),
            Self::WaveText => write!(f, "wave text"),
            Self::Archive => write!(f, "archive"),
            Self::RawBinary => write!(f, "raw binary"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

// ─── Amplitude selector ─────────────────────────────────────────────────────

/// Which of the two receiver amplitude settings to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AmplitudeKind {
    #[default]
    Primary,
    Secondary,
}

impl AmplitudeKind {
    /// Map the legacy 1/2 selector. Anything else falls back to `Primary`.
    pub fn from_index(v: i32) -> Self {
        match v {
            1 => Self::Primary,
            2 => Self::Secondary,
            other => {
                log::warn!("amplitude type must be 1 or 2 (got {}), using 1", other);
                Self::Primary
            }
        }
    }
}
