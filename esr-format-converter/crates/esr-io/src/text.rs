//! Text layouts: the annotated export and the two-column wave export.
//!
//! Both are read line by line through [`LineSource`], which counts lines
//! so malformed samples can be reported by position. Bytes are decoded
//! lossily; instrument exports are not guaranteed to be UTF-8.

use crate::error::LoadError;
use crate::samples::{sample_count, synthesize_x, MAX_PREALLOC};
use esr_core::{clean_field, parse_leading_float, RawHeader, StructuredHeader};
use std::io::BufRead;

/// Number of header lines in the annotated export.
pub const ANNOTATED_HEADER_LINES: usize = 77;
/// Marker line that opens the imaginary block of the annotated export.
pub const IMAGINARY_MARKER: &str = "Imaginary";

// ─── Line source ────────────────────────────────────────────────────────────

/// Line reader that tracks the 1-based number of the last line returned.
pub struct LineSource<R> {
    inner: R,
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_number: 0,
            buf: Vec::new(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next line without its terminator, or `None` at EOF.
    pub fn next_line(&mut self) -> Result<Option<String>, LoadError> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(
            line.trim_end_matches(|c| c == '\r' || c == '\n').to_string(),
        ))
    }

    /// Next line that is not blank, or `None` at EOF.
    pub fn next_data_line(&mut self) -> Result<Option<String>, LoadError> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    /// Skip `n` lines. Returns false when EOF came first.
    pub fn skip(&mut self, n: usize) -> Result<bool, LoadError> {
        for _ in 0..n {
            if self.next_line()?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn malformed(&self, raw_text: &str) -> LoadError {
        LoadError::MalformedSample {
            line_number: self.line_number,
            raw_text: raw_text.to_string(),
        }
    }

    /// Parse one token of the current line as a sample.
    fn parse_sample(&self, token: &str, line: &str) -> Result<f64, LoadError> {
        token.trim().parse::<f64>().map_err(|_| self.malformed(line))
    }
}

/// Read `n` single-value lines.
fn read_value_block<R: BufRead>(src: &mut LineSource<R>, n: usize) -> Result<Vec<f64>, LoadError> {
    let mut out = Vec::with_capacity(n.min(MAX_PREALLOC));
    while out.len() < n {
        let line = src.next_data_line()?.ok_or(LoadError::TruncatedStream {
            expected: n,
            got: out.len(),
        })?;
        out.push(src.parse_sample(&line, &line)?);
    }
    Ok(out)
}

/// Read `n` two-column lines, returning both columns.
///
/// `first` is read only if it is the first line of the block; once a block
/// has started, EOF is a truncation.
fn read_pair_block<R: BufRead>(
    src: &mut LineSource<R>,
    n: usize,
    first: Option<String>,
) -> Result<(Vec<f64>, Vec<f64>), LoadError> {
    let mut xs = Vec::with_capacity(n.min(MAX_PREALLOC));
    let mut ys = Vec::with_capacity(n.min(MAX_PREALLOC));
    let mut pending = first;
    while ys.len() < n {
        let line = match pending.take() {
            Some(l) => l,
            None => src.next_data_line()?.ok_or(LoadError::TruncatedStream {
                expected: n,
                got: ys.len(),
            })?,
        };
        let mut tokens = line.split_whitespace();
        let (Some(a), Some(b)) = (tokens.next(), tokens.next()) else {
            return Err(src.malformed(&line));
        };
        xs.push(src.parse_sample(a, &line)?);
        ys.push(src.parse_sample(b, &line)?);
    }
    Ok((xs, ys))
}

// ─── Annotated export ───────────────────────────────────────────────────────

/// Parse the fixed block of `key = value` header lines.
///
/// Tildes become spaces and both sides are trimmed. Lines without `=` and
/// lines whose key is empty (`=====` separators) are skipped.
pub fn parse_annotated_header<R: BufRead>(src: &mut LineSource<R>) -> Result<RawHeader, LoadError> {
    let mut raw = RawHeader::new();
    for _ in 0..ANNOTATED_HEADER_LINES {
        let Some(line) = src.next_line()? else {
            log::warn!(
                "header ended after {} of {} lines",
                src.line_number(),
                ANNOTATED_HEADER_LINES
            );
            break;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = clean_field(key);
        if key.is_empty() {
            continue;
        }
        raw.insert(key, clean_field(value));
    }
    Ok(raw)
}

/// Real block (two preamble lines, one value per line), then an optional
/// imaginary block introduced by a marker line.
pub fn read_annotated_samples<R: BufRead>(
    src: &mut LineSource<R>,
    header: &StructuredHeader,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), LoadError> {
    let n = sample_count(header.data_length());
    src.skip(2)?;
    let real = read_value_block(src, n)?;

    let (min, max) = header.x_range();
    let x = synthesize_x(min, max - min, n);

    let imag = match src.next_data_line()? {
        Some(marker) if marker.contains(IMAGINARY_MARKER) => read_value_block(src, n)?,
        _ => {
            log::info!("no imaginary block");
            Vec::new()
        }
    };
    Ok((x, real, imag))
}

// ─── Wave export ────────────────────────────────────────────────────────────

/// Text after the first `=`, cleaned. The whole line when there is none.
fn after_equals(line: &str) -> String {
    match line.split_once('=') {
        Some((_, v)) => clean_field(v),
        None => clean_field(line),
    }
}

/// Two-letter mnemonic of `token`, or empty.
fn mnemonic_prefix(token: &str) -> &str {
    let b = token.as_bytes();
    if b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1].is_ascii_alphabetic() {
        &token[..2]
    } else {
        ""
    }
}

/// Split `md1.0x100` into (`md1.0`, `md2`): the coarse part is stored as the
/// base-10 exponent of the multiplier, carrying the fine part's mnemonic.
pub fn split_fine_coarse(token: &str) -> (String, String) {
    let Some((fine, mult)) = token.split_once('x') else {
        log::warn!("no multiplier in \"{}\", assuming x1", token);
        return (token.trim().to_string(), format!("{}0", mnemonic_prefix(token)));
    };
    let exponent = match parse_leading_float(mult) {
        Some(m) if m > 0.0 => m.log10(),
        _ => {
            log::warn!("invalid multiplier in \"{}\", assuming x1", token);
            0.0
        }
    };
    (
        fine.trim().to_string(),
        format!("{}{}", mnemonic_prefix(fine), exponent),
    )
}

/// Parse the positional header of the wave export.
pub fn parse_wave_header<R: BufRead>(src: &mut LineSource<R>) -> Result<RawHeader, LoadError> {
    let mut raw = RawHeader::new();
    let next = |src: &mut LineSource<R>| -> Result<String, LoadError> {
        Ok(src.next_line()?.unwrap_or_default())
    };

    // l.1: waves=1 length=1024 data=CH1/2
    let first = next(src)?;
    let length = first
        .split_whitespace()
        .find_map(|t| t.strip_prefix("length="))
        .or_else(|| {
            first
                .split_whitespace()
                .nth(1)
                .and_then(|t| t.split_once('=').map(|(_, v)| v))
        })
        .unwrap_or_default()
        .to_string();
    raw.insert("data length", &length);
    raw.insert("length", &length);

    for key in ["title", "sample name", "comment", "date"] {
        raw.insert(key, after_equals(&next(src)?));
    }

    let line6 = next(src)?;
    let mut t6 = line6.split_whitespace();
    for key in ["center field", "sweep time", "receiver mode", "modulation freq."] {
        raw.insert(key, t6.next().unwrap_or_default());
    }
    if let Some(token) = t6.next() {
        let (fine, coarse) = split_fine_coarse(token);
        raw.insert("mod. width(fine)", fine);
        raw.insert("mod. width(coarse)", coarse);
    }

    let line7 = next(src)?;
    let mut t7 = line7.split_whitespace();
    if let Some(token) = t7.next() {
        let (fine, coarse) = split_fine_coarse(token);
        raw.insert("amplitude(fine)", fine);
        raw.insert("amplitude(coarse)", coarse);
    }
    raw.insert("time constant", t7.next().unwrap_or_default());
    raw.insert("micro frequency", t7.next().unwrap_or_default());
    if let Some(unit) = t7.next() {
        raw.insert("micro freq. unit", format!("UF{}", unit));
    }
    raw.insert("micro power", t7.next().unwrap_or_default());
    if let Some(unit) = t7.next() {
        raw.insert("micro power unit", format!("UP{}", unit));
    }

    raw.insert("accumulation count", after_equals(&next(src)?));
    Ok(raw)
}

/// `(x, real, imag)` from the two wave blocks. The imaginary block is
/// optional; its first column repeats x and is discarded.
pub fn read_wave_samples<R: BufRead>(
    src: &mut LineSource<R>,
    header: &StructuredHeader,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), LoadError> {
    let n = sample_count(header.data_length());
    src.skip(2)?;
    let (x, real) = read_pair_block(src, n, None)?;

    let imag = if !src.skip(2)? {
        Vec::new()
    } else {
        match src.next_data_line()? {
            None => Vec::new(),
            Some(first) => read_pair_block(src, n, Some(first))?.1,
        }
    };
    if imag.is_empty() {
        log::info!("no imaginary block");
    }
    Ok((x, real, imag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn source(text: &str) -> LineSource<Cursor<Vec<u8>>> {
        LineSource::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn annotated_header(length: usize) -> String {
        let mut lines = vec![
            "=============== Data Head ===============".to_string(),
            "file name       = sample~01".to_string(),
            format!("data length     = {}", length),
            "x-range min     = 0".to_string(),
            format!("x-range         = {}", length),
            "amplitude(fine) = am2.0".to_string(),
            "amplitude(coarse) = am1".to_string(),
            "date            = 2016/05/12~14:03".to_string(),
            "no separator on this line".to_string(),
        ];
        while lines.len() < ANNOTATED_HEADER_LINES {
            lines.push(format!("reserved{} = ", lines.len()));
        }
        lines.join("\n") + "\n"
    }

    #[test]
    fn test_annotated_header() {
        let mut src = source(&annotated_header(4));
        let raw = parse_annotated_header(&mut src).unwrap();
        assert_eq!(src.line_number(), ANNOTATED_HEADER_LINES);
        assert_eq!(raw.get("file name"), Some("sample 01"));
        assert_eq!(raw.get("date"), Some("2016/05/12 14:03"));
        assert_eq!(raw.int("data length"), 4);
        assert!(!raw.contains_key(""));
        assert!(!raw.contains_key("no separator on this line"));
    }

    #[test]
    fn test_annotated_samples_with_imaginary() {
        let text = annotated_header(4)
            + "Esr Data\nReal\n1.0\n2.0\n3.0\n4.0\nImaginary\n0.5\n0.5\n0.5\n0.5\n";
        let mut src = source(&text);
        let raw = parse_annotated_header(&mut src).unwrap();
        let header = StructuredHeader::from(&raw);
        let (x, real, imag) = read_annotated_samples(&mut src, &header).unwrap();
        assert_eq!(x, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(real, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(imag, vec![0.5; 4]);
    }

    #[test]
    fn test_annotated_without_imaginary() {
        let text = annotated_header(2) + "Esr Data\nReal\n1.0\n2.0\n";
        let mut src = source(&text);
        let header = StructuredHeader::from(&parse_annotated_header(&mut src).unwrap());
        let (_, real, imag) = read_annotated_samples(&mut src, &header).unwrap();
        assert_eq!(real.len(), 2);
        assert!(imag.is_empty());
    }

    #[test]
    fn test_annotated_malformed_sample() {
        let text = annotated_header(3) + "Esr Data\nReal\n1.0\nnot-a-number\n3.0\n";
        let mut src = source(&text);
        let header = StructuredHeader::from(&parse_annotated_header(&mut src).unwrap());
        match read_annotated_samples(&mut src, &header) {
            Err(LoadError::MalformedSample {
                line_number,
                raw_text,
            }) => {
                assert_eq!(line_number, ANNOTATED_HEADER_LINES + 4);
                assert_eq!(raw_text, "not-a-number");
            }
            other => panic!("expected MalformedSample, got {:?}", other),
        }
    }

    #[test]
    fn test_annotated_truncated() {
        let text = annotated_header(5) + "Esr Data\nReal\n1.0\n2.0\n";
        let mut src = source(&text);
        let header = StructuredHeader::from(&parse_annotated_header(&mut src).unwrap());
        match read_annotated_samples(&mut src, &header) {
            Err(LoadError::TruncatedStream { expected, got }) => {
                assert_eq!((expected, got), (5, 2));
            }
            other => panic!("expected TruncatedStream, got {:?}", other),
        }
    }

    const WAVE: &str = "waves=1 length=3 data=CH1/2\n\
        title=test~run\n\
        sample name=DPPH\n\
        comment=none\n\
        date=2016/05/12 14:03\n\
        cf336.0 st2.0 rm1st mf100.0 md1.0x10\n\
        am5.0x100 tc0.03 9.45 GHz 1.0 mW\n\
        accumulation=4\n\
        ===== CH1 data Wave No.1 =====\n\
        mT Intensity\n\
        330.0 1.0\n\
        331.0 2.0\n\
        332.0 3.0\n\
        ===== CH2 data Wave No.1 =====\n\
        mT Intensity\n\
        330.0 -1.0\n\
        331.0 -2.0\n\
        332.0 -3.0\n";

    #[test]
    fn test_wave_header() {
        let mut src = source(WAVE);
        let raw = parse_wave_header(&mut src).unwrap();
        assert_eq!(raw.get("data length"), Some("3"));
        assert_eq!(raw.get("length"), Some("3"));
        assert_eq!(raw.get("title"), Some("test run"));
        assert_eq!(raw.get("sample name"), Some("DPPH"));
        assert_eq!(raw.get("center field"), Some("cf336.0"));
        assert_eq!(raw.get("mod. width(fine)"), Some("md1.0"));
        assert_eq!(raw.get("mod. width(coarse)"), Some("md1"));
        assert_eq!(raw.get("amplitude(fine)"), Some("am5.0"));
        assert_eq!(raw.get("amplitude(coarse)"), Some("am2"));
        assert_eq!(raw.get("micro freq. unit"), Some("UFGHz"));
        assert_eq!(raw.get("micro power unit"), Some("UPmW"));
        assert_eq!(raw.get("accumulation count"), Some("4"));

        let header = StructuredHeader::from(&raw);
        assert!((header.gain() - 500.0).abs() < 1e-9);
        assert!((header.spectrometer.microwave.frequency_mhz() - 9450.0).abs() < 1e-6);
        assert_eq!(header.acquisition.accumulation_count, 4);
    }

    #[test]
    fn test_wave_samples() {
        let mut src = source(WAVE);
        let header = StructuredHeader::from(&parse_wave_header(&mut src).unwrap());
        let (x, real, imag) = read_wave_samples(&mut src, &header).unwrap();
        assert_eq!(x, vec![330.0, 331.0, 332.0]);
        assert_eq!(real, vec![1.0, 2.0, 3.0]);
        assert_eq!(imag, vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_wave_without_imaginary_block() {
        let cut = WAVE.find("===== CH2").unwrap();
        let mut src = source(&WAVE[..cut]);
        let header = StructuredHeader::from(&parse_wave_header(&mut src).unwrap());
        let (_, real, imag) = read_wave_samples(&mut src, &header).unwrap();
        assert_eq!(real.len(), 3);
        assert!(imag.is_empty());
    }

    #[test]
    fn test_wave_truncated_imaginary_block() {
        let cut = WAVE.rfind("332.0 -3.0").unwrap();
        let mut src = source(&WAVE[..cut]);
        let header = StructuredHeader::from(&parse_wave_header(&mut src).unwrap());
        assert!(matches!(
            read_wave_samples(&mut src, &header),
            Err(LoadError::TruncatedStream {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn test_wave_missing_column() {
        let broken = WAVE.replace("331.0 2.0", "331.0");
        let mut src = source(&broken);
        let header = StructuredHeader::from(&parse_wave_header(&mut src).unwrap());
        assert!(matches!(
            read_wave_samples(&mut src, &header),
            Err(LoadError::MalformedSample { line_number: 12, .. })
        ));
    }

    #[test]
    fn test_split_fine_coarse() {
        assert_eq!(
            split_fine_coarse("am2.5x100"),
            ("am2.5".to_string(), "am2".to_string())
        );
        assert_eq!(split_fine_coarse("1.0x1"), ("1.0".to_string(), "0".to_string()));
        assert_eq!(split_fine_coarse("am1.0"), ("am1.0".to_string(), "am0".to_string()));
    }
}
