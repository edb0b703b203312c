//! Archive container: a raw header plus one record per raw sample.
//!
//! The container layout is pluggable through [`ArchiveCodec`]. The bundled
//! [`JsonArchiveCodec`] writes the `root` tag, a big-endian version, and a
//! JSON body with the two record streams `header` and `data`.

use crate::detect::{ARCHIVE_MIN_VERSION, ARCHIVE_TAG};
use crate::error::LoadError;
use crate::samples::RawSamples;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use esr_core::RawHeader;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Version written by [`JsonArchiveCodec`].
pub const ARCHIVE_VERSION: u32 = 60000;

/// Reads and writes the archive's `header` and `data` record streams.
pub trait ArchiveCodec {
    /// Decode a whole archive, starting at its tag.
    fn decode(&self, reader: &mut dyn Read) -> Result<(RawHeader, RawSamples), LoadError>;

    /// Encode `header` and `samples` as a complete archive.
    fn encode(
        &self,
        writer: &mut dyn Write,
        header: &RawHeader,
        samples: &RawSamples,
    ) -> io::Result<()>;
}

/// One `data` record. Non-finite values are stored as `null` and read back
/// as NaN; an imaginary column that is `null` throughout means "absent".
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SampleRecord {
    x: Option<f64>,
    y: Option<f64>,
    y_imag: Option<f64>,
    y_norm: Option<f64>,
    y_imag_norm: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveBody {
    header: Option<Vec<(String, String)>>,
    data: Option<Vec<SampleRecord>>,
}

fn finite(v: Option<&f64>) -> Option<f64> {
    v.copied().filter(|v| v.is_finite())
}

fn or_nan(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArchiveCodec;

impl ArchiveCodec for JsonArchiveCodec {
    fn decode(&self, reader: &mut dyn Read) -> Result<(RawHeader, RawSamples), LoadError> {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let version = reader.read_i32::<BigEndian>()?;
        if &tag != ARCHIVE_TAG || version <= ARCHIVE_MIN_VERSION {
            return Err(LoadError::MalformedArchive(format!(
                "bad tag {:?} or version {}",
                String::from_utf8_lossy(&tag),
                version
            )));
        }

        let body: ArchiveBody = serde_json::from_reader(reader)
            .map_err(|e| LoadError::MalformedArchive(e.to_string()))?;
        let pairs = body
            .header
            .ok_or_else(|| LoadError::ArchiveStructureMissing("header".into()))?;
        let records = body
            .data
            .ok_or_else(|| LoadError::ArchiveStructureMissing("data".into()))?;

        let header: RawHeader = pairs.into_iter().collect();
        let has_imag = records.iter().any(|r| r.y_imag.is_some());

        let mut samples = RawSamples::default();
        for r in &records {
            samples.x.push(or_nan(r.x));
            samples.real.push(or_nan(r.y));
            samples.real_norm.push(or_nan(r.y_norm));
            if has_imag {
                samples.imag.push(or_nan(r.y_imag));
                samples.imag_norm.push(or_nan(r.y_imag_norm));
            }
        }
        log::info!(
            "archive: {} header entries, {} samples",
            header.len(),
            samples.len()
        );
        Ok((header, samples))
    }

    fn encode(
        &self,
        writer: &mut dyn Write,
        header: &RawHeader,
        samples: &RawSamples,
    ) -> io::Result<()> {
        let data = (0..samples.len())
            .map(|i| SampleRecord {
                x: finite(samples.x.get(i)),
                y: finite(samples.real.get(i)),
                y_imag: finite(samples.imag.get(i)),
                y_norm: finite(samples.real_norm.get(i)),
                y_imag_norm: finite(samples.imag_norm.get(i)),
            })
            .collect();
        let body = ArchiveBody {
            header: Some(
                header
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            data: Some(data),
        };

        writer.write_all(ARCHIVE_TAG)?;
        writer.write_u32::<BigEndian>(ARCHIVE_VERSION)?;
        serde_json::to_writer(&mut *writer, &body)?;
        writer.flush()
    }
}
