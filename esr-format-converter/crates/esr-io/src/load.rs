//! Load entry point: detect, parse header, extract samples, collect warnings.

use crate::archive::{ArchiveCodec, JsonArchiveCodec};
use crate::binary::{parse_binary_header, read_binary_samples};
use crate::detect::detect_format;
use crate::error::{EsrWarning, LoadError};
use crate::samples::RawSamples;
use crate::text::{
    parse_annotated_header, parse_wave_header, read_annotated_samples, read_wave_samples,
    LineSource,
};
use esr_core::{missing_keys, FileType, RawHeader, StructuredHeader, MANDATORY_KEYS};
use std::io::{BufReader, Read, Seek};

/// Header keys the wave layout never carries; its x range comes from the data.
const WAVE_DERIVED_KEYS: &[&str] = &["x-range min", "x-range"];

/// Everything recovered from one file.
#[derive(Debug, Clone, Default)]
pub struct LoadedFile {
    pub file_type: FileType,
    pub raw_header: RawHeader,
    pub header: StructuredHeader,
    pub samples: RawSamples,
    pub warnings: Vec<EsrWarning>,
}

/// Load any supported layout, reading archives with [`JsonArchiveCodec`].
pub fn load<R: Read + Seek>(reader: &mut R) -> Result<LoadedFile, LoadError> {
    load_with_codec(reader, &JsonArchiveCodec)
}

/// Load any supported layout, reading archives with `codec`.
pub fn load_with_codec<R, C>(reader: &mut R, codec: &C) -> Result<LoadedFile, LoadError>
where
    R: Read + Seek,
    C: ArchiveCodec + ?Sized,
{
    let file_type = detect_format(reader);
    let mut warnings = Vec::new();

    let (raw_header, header, samples) = match file_type {
        FileType::Unrecognized => return Err(LoadError::UnrecognizedFormat),
        FileType::Archive => {
            let (raw, samples) = codec.decode(reader)?;
            report_missing(&raw, MANDATORY_KEYS, &mut warnings);
            let header = StructuredHeader::from(&raw);
            (raw, header, samples)
        }
        FileType::TextAnnotated => {
            let mut src = LineSource::new(BufReader::new(reader));
            let raw = parse_annotated_header(&mut src)?;
            report_missing(&raw, MANDATORY_KEYS, &mut warnings);
            let header = StructuredHeader::from(&raw);
            let (x, real, imag) = read_annotated_samples(&mut src, &header)?;
            let samples = RawSamples::from_channels(x, real, imag, header.gain());
            (raw, header, samples)
        }
        FileType::WaveText => {
            let mut src = LineSource::new(BufReader::new(reader));
            let mut raw = parse_wave_header(&mut src)?;
            let wanted: Vec<&str> = MANDATORY_KEYS
                .iter()
                .copied()
                .filter(|k| !WAVE_DERIVED_KEYS.contains(k))
                .collect();
            report_missing(&raw, &wanted, &mut warnings);
            let mut header = StructuredHeader::from(&raw);
            let (x, real, imag) = read_wave_samples(&mut src, &header)?;
            if let (Some(&first), Some(&last)) = (x.first(), x.last()) {
                raw.insert("x-range min", first.to_string());
                raw.insert("x-range", (last - first).to_string());
                header.set_x_range((first, last));
            }
            let samples = RawSamples::from_channels(x, real, imag, header.gain());
            (raw, header, samples)
        }
        FileType::RawBinary => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            let raw = parse_binary_header(&buf);
            report_missing(&raw, MANDATORY_KEYS, &mut warnings);
            let header = StructuredHeader::from(&raw);
            let (x, real, imag) = read_binary_samples(&buf, &header)?;
            let samples = RawSamples::from_channels(x, real, imag, header.gain());
            (raw, header, samples)
        }
    };

    if !header.data_head.is_well_formed() {
        EsrWarning::NegativeXRange {
            width: header.data_head.x_range_width,
        }
        .report(&mut warnings);
    }
    if let Some((data_length, descriptor_length)) = header.length_mismatch() {
        EsrWarning::LengthMismatch {
            data_length,
            descriptor_length,
        }
        .report(&mut warnings);
    }
    if header.gain() == 0.0 && !samples.real.is_empty() {
        EsrWarning::ZeroGain.report(&mut warnings);
    }

    log::info!(
        "loaded {} file: {} samples, gain {}",
        file_type,
        samples.len(),
        header.gain()
    );
    Ok(LoadedFile {
        file_type,
        raw_header,
        header,
        samples,
        warnings,
    })
}

fn report_missing(raw: &RawHeader, wanted: &[&str], warnings: &mut Vec<EsrWarning>) {
    for key in missing_keys(raw, wanted) {
        EsrWarning::HeaderFieldMissing {
            key: key.to_string(),
        }
        .report(warnings);
    }
}
