//! Logged analysis operations
//!
//! Each operation acts on an `EsrDataset` and records a typed
//! [`Operation`] in the reproducibility log. The `*_from`/`*_to` variants
//! take any reader or writer; the path variants open the file first.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::config::LoadOptions;
use crate::data::dataset::EsrDataset;
use crate::data::series::Channel;
use crate::error::AnalysisError;
use crate::log::reproducibility::{Operation, ReproLog};
use crate::pipeline::integrate::IntegrationWindow;

/// Record every warning added to `ds` since index `since`.
fn record_new_warnings(ds: &EsrDataset, since: usize, log: &mut ReproLog) {
    for w in ds.warnings().iter().skip(since) {
        log.record(Operation::Warning { warning: w.clone() });
    }
}

// =========================================================================
//  Load
// =========================================================================

/// Load a file and record the load, plus any warnings it produced.
pub fn load_dataset(
    path: &Path,
    options: &LoadOptions,
    log: &mut ReproLog,
) -> Result<EsrDataset, AnalysisError> {
    let mut reader = BufReader::new(File::open(path)?);
    load_dataset_from(&mut reader, path, options, log)
}

/// Load from `reader`; `source` names the input in the dataset and in
/// replayed commands.
pub fn load_dataset_from<R: Read + Seek>(
    reader: &mut R,
    source: &Path,
    options: &LoadOptions,
    log: &mut ReproLog,
) -> Result<EsrDataset, AnalysisError> {
    let ds = EsrDataset::from_reader(reader, options)?.with_file_path(source);

    log.set_source(&source.display().to_string());
    log.record(Operation::Load {
        file_type: ds.file_type(),
        samples: ds.raw().len(),
        gain: ds.gain(),
        reduction_factor: ds.reduction_factor(),
    });
    record_new_warnings(&ds, 0, log);
    Ok(ds)
}

// =========================================================================
//  Reduction
// =========================================================================

/// Change the reduction factor; reduced and integrated channels are rebuilt.
pub fn apply_reduction(ds: &mut EsrDataset, factor: i64, log: &mut ReproLog) {
    ds.set_reduction_factor(factor);
    log.record(Operation::Reduce {
        requested: factor,
        applied: ds.reduction_factor(),
        points: ds.raw().len(),
        reduced_points: ds.reduced().len(),
    });
}

// =========================================================================
//  Integration
// =========================================================================

/// Integrate one channel over `window` and record the resulting area. An
/// out-of-range window records its warning instead and gives 0.
pub fn integrate_window(
    ds: &mut EsrDataset,
    window: &IntegrationWindow,
    channel: Channel,
    log: &mut ReproLog,
) -> f64 {
    let before = ds.warnings().len();
    let area = ds.integrate(window, channel);
    if ds.warnings().len() > before {
        record_new_warnings(ds, before, log);
        return area;
    }
    log.record(Operation::Integrate {
        reduction_factor: ds.reduction_factor(),
        window: window.ordered(),
        channel,
        area,
    });
    area
}

// =========================================================================
//  Export
// =========================================================================

/// Write the raw header and samples as an archive file.
pub fn export_archive(
    ds: &EsrDataset,
    path: &Path,
    log: &mut ReproLog,
) -> Result<(), AnalysisError> {
    let mut out = BufWriter::new(File::create(path)?);
    export_archive_to(ds, &mut out, &path.display().to_string(), log)?;
    out.flush()?;
    Ok(())
}

/// Write the archive to `writer`; `target` is what the log records.
pub fn export_archive_to<W: Write>(
    ds: &EsrDataset,
    writer: &mut W,
    target: &str,
    log: &mut ReproLog,
) -> Result<(), AnalysisError> {
    ds.write_archive(writer)?;
    log.record(Operation::Export {
        target: target.to_string(),
        samples: ds.raw().len(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use esr_core::{FileType, RawHeader};
    use esr_io::{ArchiveCodec, EsrWarning, JsonArchiveCodec, RawSamples};
    use std::io::Cursor;

    /// Archive with x = 0..8, y = x, gain 2.
    fn archive_fixture() -> Cursor<Vec<u8>> {
        let mut raw = RawHeader::new();
        raw.insert("data length", "8");
        raw.insert("length", "8");
        raw.insert("x-range min", "0");
        raw.insert("x-range", "8");
        raw.insert("amplitude(fine)", "am2.0");
        raw.insert("amplitude(coarse)", "am0");
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let samples = RawSamples::from_channels(x.clone(), x, vec![], 2.0);
        let mut bytes = Vec::new();
        JsonArchiveCodec.encode(&mut bytes, &raw, &samples).unwrap();
        Cursor::new(bytes)
    }

    #[test]
    fn test_session_records_every_step() {
        let mut log = ReproLog::new();
        let source = Path::new("runs/fixture.root");

        let mut ds =
            load_dataset_from(&mut archive_fixture(), source, &LoadOptions::default(), &mut log)
                .unwrap();
        assert_eq!(ds.file_path(), Some(source));
        apply_reduction(&mut ds, 2, &mut log);
        let area = integrate_window(
            &mut ds,
            &IntegrationWindow::new(8.0, 0.0),
            Channel::RealNormalized,
            &mut log,
        );
        assert!(area > 0.0);

        let mut out = Vec::new();
        export_archive_to(&ds, &mut out, "out.root", &mut log).unwrap();
        let back = EsrDataset::from_reader(&mut Cursor::new(out), &LoadOptions::default()).unwrap();
        assert_eq!(back.raw(), ds.raw());

        let ops: Vec<&str> = log.entries().iter().map(|e| e.operation.name()).collect();
        assert_eq!(ops, vec!["load", "reduce", "integrate", "export"]);
        assert!(matches!(
            log.entries()[0].operation,
            Operation::Load {
                file_type: FileType::Archive,
                samples: 8,
                ..
            }
        ));
        assert_eq!(
            log.command_line(2).unwrap(),
            "esr-analyze runs/fixture.root --reduce 2 --window 0 8 --norm"
        );
        assert_eq!(
            log.command_line(3).unwrap(),
            "esr-analyze runs/fixture.root --export out.root"
        );
    }

    #[test]
    fn test_invalid_requests_are_logged() {
        let mut log = ReproLog::new();
        let mut ds = load_dataset_from(
            &mut archive_fixture(),
            Path::new("fixture.root"),
            &LoadOptions::default(),
            &mut log,
        )
        .unwrap();

        apply_reduction(&mut ds, 0, &mut log);
        assert_eq!(ds.reduction_factor(), 1);
        assert_eq!(
            log.entries()[1].operation,
            Operation::Reduce {
                requested: 0,
                applied: 1,
                points: 8,
                reduced_points: 8,
            }
        );

        let area = integrate_window(
            &mut ds,
            &IntegrationWindow::new(-1.0, 4.0),
            Channel::Real,
            &mut log,
        );
        assert_eq!(area, 0.0);
        assert_eq!(log.len(), 3);
        assert!(matches!(
            log.entries()[2].operation,
            Operation::Warning {
                warning: EsrWarning::IntegrationRangeOutOfBounds { .. }
            }
        ));
        assert_eq!(log.command_line(2), None);
        assert!(matches!(
            ds.warnings().last(),
            Some(EsrWarning::IntegrationRangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_load_warnings_follow_the_load_entry() {
        let mut log = ReproLog::new();
        let result = load_dataset_from(
            &mut archive_fixture(),
            Path::new("fixture.root"),
            &LoadOptions::with_reduction_factor(20),
            &mut log,
        );
        let ds = result.unwrap();
        assert_eq!(ds.reduction_factor(), 8);
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.entries()[1].operation,
            Operation::Warning {
                warning: EsrWarning::InvalidReductionFactor {
                    requested: 20,
                    applied: 8
                }
            }
        );
    }

    #[test]
    fn test_failed_load_records_nothing() {
        let mut log = ReproLog::new();
        let result = load_dataset_from(
            &mut Cursor::new(vec![0u8; 32]),
            Path::new("empty.bin"),
            &LoadOptions::default(),
            &mut log,
        );
        assert!(matches!(result, Err(AnalysisError::Load(_))));
        assert!(log.is_empty());
    }
}
