//! Raw binary dump: fixed-offset header fields and a trailing float block.
//!
//! The header is described by the declarative [`FIELDS`] table; every entry
//! is decoded independently from the file buffer, so a short file simply
//! leaves the later keys absent. Numeric fields are little-endian and are
//! stored in the raw header as their decimal string form.

use crate::error::LoadError;
use crate::samples::{sample_count, synthesize_x};
use byteorder::{ByteOrder, LittleEndian};
use esr_core::{RawHeader, StructuredHeader};

/// Start of the sample region: `n` real floats then `n` imaginary floats.
pub const SAMPLE_OFFSET: usize = 0x251c;

/// How a field's bytes become a header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// NUL-terminated text.
    Text,
    /// NUL-terminated text after a two-byte prefix.
    TextSkip2,
    I32,
    F32,
}

/// One entry of the binary header layout.
#[derive(Debug, Clone, Copy)]
pub struct BinaryField {
    pub offset: usize,
    pub width: usize,
    pub key: &'static str,
    pub decode: Decode,
}

const fn field(offset: usize, width: usize, key: &'static str, decode: Decode) -> BinaryField {
    BinaryField {
        offset,
        width,
        key,
        decode,
    }
}

use Decode::*;

/// Header layout, applied in order (later entries win on duplicate keys).
pub const FIELDS: &[BinaryField] = &[
    // data head
    field(0x0000, 0x10, "type", Text),
    field(0x0010, 0x40, "file name", Text),
    field(0x0056, 4, "data length", I32),
    field(0x0056, 4, "length", I32),
    field(0x0060, 0x10, "data sort", Text),
    field(0x0070, 4, "x-range min", F32),
    field(0x0074, 4, "x-range", F32),
    field(0x0078, 2, "x unit", Text),
    field(0x00b4, 4, "x-view min", F32),
    field(0x00b8, 4, "x-view max", F32),
    field(0x00bc, 4, "y-view min", F32),
    field(0x00c0, 4, "y-view max", F32),
    // sweep
    field(0x18ac, 4, "type", Text),
    field(0x18fc, 0x10, "center field", Text),
    field(0x190c, 0x10, "sweep width(fine)", Text),
    field(0x191c, 0x10, "sweep width(coar)", Text),
    field(0x194c, 4, "sweep time", Text),
    field(0x197c, 0x10, "sweep control", Text),
    // modulation and receiver
    field(0x1a5c, 0x10, "modulation freq.", Text),
    field(0x1a6c, 0x10, "mod. width(fine)", Text),
    field(0x1a7c, 0x10, "mod. width(coarse)", Text),
    field(0x1a8c, 0x10, "phase", Text),
    field(0x1a9c, 0x10, "receiver mode", Text),
    field(0x1aac, 0x10, "phase (fine)", Text),
    field(0x1abc, 0x10, "amplitude(fine)", Text),
    field(0x1acc, 0x10, "amplitude(coarse)", Text),
    field(0x1adc, 0x10, "time constant", Text),
    field(0x1aec, 0x10, "zero", Text),
    field(0x1afb, 0x10, "receiver mode2", Text),
    field(0x1b0c, 0x10, "phase2 (fine)", Text),
    field(0x1b1c, 0x10, "amplitude2(fine)", Text),
    field(0x1b2c, 0x10, "amplitude2(coars)", Text),
    field(0x1b3c, 0x10, "time constant2", Text),
    // microwave
    field(0x1bf4, 0x10, "micro frequency", Text),
    field(0x1c04, 8, "micro freq. unit", Text),
    field(0x1c0c, 0x10, "micro power", Text),
    field(0x1c1c, 8, "micro power unit", Text),
    field(0x1c24, 0x10, "micro phase", Text),
    field(0x1cb4, 8, "micro gunp", Text),
    field(0x1cbc, 8, "micro ref", Text),
    field(0x1cc4, 8, "micro 30db", Text),
    // temperature
    field(0x1eac, 0x10, "vt type", Text),
    field(0x1ebc, 0x10, "temperature", TextSkip2),
    field(0x1efc, 4, "temperature unit", TextSkip2),
    // acquisition
    field(0x205c, 0x10, "date", Text),
    field(0x20b8, 8, "accumulation mode", Text),
    field(0x20c0, 8, "baseline", Text),
    field(0x20c8, 8, "sampling mode", Text),
];

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

impl BinaryField {
    /// Decode this field from the whole file buffer. `None` when the file
    /// ends before the field (numeric fields need all four bytes).
    pub fn decode_from(&self, buf: &[u8]) -> Option<String> {
        if self.offset >= buf.len() {
            return None;
        }
        let end = (self.offset + self.width).min(buf.len());
        let bytes = &buf[self.offset..end];
        match self.decode {
            Text => Some(c_string(bytes)),
            TextSkip2 => Some(c_string(bytes.get(2..).unwrap_or_default())),
            I32 if bytes.len() >= 4 => Some(LittleEndian::read_i32(bytes).to_string()),
            F32 if bytes.len() >= 4 => Some(LittleEndian::read_f32(bytes).to_string()),
            I32 | F32 => None,
        }
    }
}

/// Build the raw header from the file buffer using [`FIELDS`].
pub fn parse_binary_header(buf: &[u8]) -> RawHeader {
    let mut raw = RawHeader::new();
    for f in FIELDS {
        match f.decode_from(buf) {
            Some(value) => {
                log::debug!("0x{:04x} {:<20} = \"{}\"", f.offset, f.key, value);
                raw.insert(f.key, value);
            }
            None => log::debug!("0x{:04x} {:<20} beyond end of file", f.offset, f.key),
        }
    }
    raw
}

/// `(x, real, imag)` from the sample region; x is synthesized from the
/// header range.
pub fn read_binary_samples(
    buf: &[u8],
    header: &StructuredHeader,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), LoadError> {
    let n = sample_count(header.data_length());
    let expected = n.saturating_mul(2);
    let region = buf.get(SAMPLE_OFFSET..).unwrap_or_default();
    let got = region.len() / 4;
    if got < expected {
        return Err(LoadError::TruncatedStream { expected, got });
    }

    let mut floats = region
        .chunks_exact(4)
        .map(|c| f64::from(LittleEndian::read_f32(c)));
    let real: Vec<f64> = floats.by_ref().take(n).collect();
    let imag: Vec<f64> = floats.take(n).collect();

    let (min, max) = header.x_range();
    let x = synthesize_x(min, max - min, n);
    Ok((x, real, imag))
}
