//! Classify a stream into one of the supported layouts.

use byteorder::{BigEndian, ByteOrder};
use esr_core::FileType;
use std::io::{Read, Seek, SeekFrom};

/// Archive container tag.
pub const ARCHIVE_TAG: &[u8; 4] = b"root";
/// Archives written by older containers are rejected.
pub const ARCHIVE_MIN_VERSION: i32 = 50000;

/// Only this many bytes are inspected when looking for the first line.
const PROBE_BYTES: u64 = 4096;
/// Leading bytes checked for the raw binary dump.
const BINARY_PROBE_BYTES: usize = 16;

/// Inspect the start of `reader` and classify it.
///
/// Never fails: an unreadable stream is `Unrecognized`. The position is
/// restored to the start before returning.
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> FileType {
    let mut probe = Vec::new();
    let read = reader
        .seek(SeekFrom::Start(0))
        .and_then(|_| reader.by_ref().take(PROBE_BYTES).read_to_end(&mut probe));
    if let Err(e) = read {
        log::warn!("failed to read stream for format detection: {}", e);
        return FileType::Unrecognized;
    }
    if let Err(e) = reader.seek(SeekFrom::Start(0)) {
        log::warn!("failed to rewind stream after format detection: {}", e);
        return FileType::Unrecognized;
    }

    let file_type = classify(&probe);
    log::info!("detected {} layout", file_type);
    file_type
}

/// Classify the first bytes of a file.
pub fn classify(probe: &[u8]) -> FileType {
    let first_line_end = probe.iter().position(|&b| b == b'\n').unwrap_or(probe.len());
    let first_line = String::from_utf8_lossy(&probe[..first_line_end]);

    if first_line.contains("Data Head") {
        return FileType::TextAnnotated;
    }
    if first_line.contains("wave") {
        return FileType::WaveText;
    }
    if is_archive(probe) {
        return FileType::Archive;
    }
    let head = &probe[..probe.len().min(BINARY_PROBE_BYTES)];
    if head.iter().any(|&b| b != 0) {
        return FileType::RawBinary;
    }
    log::warn!("strange file format");
    FileType::Unrecognized
}

/// `root` tag followed by a big-endian version above [`ARCHIVE_MIN_VERSION`].
pub fn is_archive(probe: &[u8]) -> bool {
    probe.len() >= 8
        && &probe[..4] == ARCHIVE_TAG
        && BigEndian::read_i32(&probe[4..8]) > ARCHIVE_MIN_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn detect(bytes: &[u8]) -> (FileType, u64) {
        let mut cur = Cursor::new(bytes.to_vec());
        cur.set_position(3.min(bytes.len() as u64));
        let ft = detect_format(&mut cur);
        (ft, cur.position())
    }

    #[test]
    fn test_text_layouts() {
        assert_eq!(
            detect(b"=== Data Head ===\nfile name = a\n").0,
            FileType::TextAnnotated
        );
        assert_eq!(
            detect(b"waves=1 length=4 data=CH1/2\n").0,
            FileType::WaveText
        );
    }

    #[test]
    fn test_archive_version_gate() {
        let mut bytes = b"root".to_vec();
        bytes.extend_from_slice(&60000u32.to_be_bytes());
        bytes.extend_from_slice(b"{}");
        assert_eq!(detect(&bytes).0, FileType::Archive);

        let mut old = b"root".to_vec();
        old.extend_from_slice(&40000u32.to_be_bytes());
        // old archive still has non-null leading bytes
        assert_eq!(detect(&old).0, FileType::RawBinary);
    }

    #[test]
    fn test_binary_and_unrecognized() {
        let mut bytes = vec![0u8; 64];
        bytes[..5].copy_from_slice(b"cAcqu");
        assert_eq!(detect(&bytes).0, FileType::RawBinary);

        let mut late = vec![0u8; 64];
        late[10] = 7;
        assert_eq!(detect(&late).0, FileType::RawBinary);

        assert_eq!(detect(&[0u8; 64]).0, FileType::Unrecognized);
        assert_eq!(detect(&[]).0, FileType::Unrecognized);
    }

    #[test]
    fn test_position_restored() {
        let (_, pos) = detect(b"=== Data Head ===\nrest of file\n");
        assert_eq!(pos, 0);
        let (_, pos) = detect(&[1u8; 32]);
        assert_eq!(pos, 0);
    }

    #[test]
    fn test_marker_only_on_first_line() {
        assert_eq!(
            detect(b"\x01binary\nwave on second line\n").0,
            FileType::RawBinary
        );
    }
}
