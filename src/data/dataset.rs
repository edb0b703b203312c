//! `EsrDataset`: owns the header and every stage of every channel.
//!
//! A dataset is built by one load. Raw channels never change afterwards;
//! reduced and integrated channels are rebuilt wholesale whenever the
//! reduction factor changes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use esr_core::{FileType, RawHeader, StructuredHeader};
use esr_io::{
    load_with_codec, ArchiveCodec, JsonArchiveCodec, LoadError, EsrWarning, LoadedFile,
    RawSamples,
};

use super::series::{Channel, Channels, IntegratedChannels, Stage, XySeries};
use crate::config::LoadOptions;
use crate::error::AnalysisError;
use crate::pipeline::integrate::{trapezoid_cumulative, IntegrationWindow};
use crate::pipeline::reduce::{check_reduction_factor, reduce_channels};

/// One loaded ESR spectrum.
///
/// `Default` is the empty, unrecognized dataset; [`EsrDataset::take`] leaves
/// the source in that state.
#[derive(Debug, Clone, Default)]
pub struct EsrDataset {
    file_type: FileType,
    file_path: Option<PathBuf>,
    raw_header: RawHeader,
    header: StructuredHeader,
    raw: Channels,
    reduced: Channels,
    integrated: IntegratedChannels,
    reduction_factor: i64,
    warnings: Vec<EsrWarning>,
}

impl EsrDataset {
    // =====================================================================
    //  Construction
    // =====================================================================

    /// Open and load `path`.
    pub fn open(path: &Path, options: &LoadOptions) -> Result<Self, AnalysisError> {
        let mut reader = BufReader::new(File::open(path)?);
        Ok(Self::from_reader(&mut reader, options)?.with_file_path(path))
    }

    /// Name the file this dataset was read from.
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Load from a seekable stream, reading archives with [`JsonArchiveCodec`].
    pub fn from_reader<R: Read + Seek>(
        reader: &mut R,
        options: &LoadOptions,
    ) -> Result<Self, LoadError> {
        Self::from_reader_with_codec(reader, options, &JsonArchiveCodec)
    }

    pub fn from_reader_with_codec<R, C>(
        reader: &mut R,
        options: &LoadOptions,
        codec: &C,
    ) -> Result<Self, LoadError>
    where
        R: Read + Seek,
        C: ArchiveCodec + ?Sized,
    {
        let loaded = load_with_codec(reader, codec)?;
        Ok(Self::from_loaded(loaded, options))
    }

    /// Build from an already loaded file, then reduce and integrate.
    pub fn from_loaded(loaded: LoadedFile, options: &LoadOptions) -> Self {
        let mut ds = Self {
            file_type: loaded.file_type,
            file_path: None,
            raw_header: loaded.raw_header,
            header: loaded.header,
            raw: Channels::from(loaded.samples),
            reduced: Channels::default(),
            integrated: IntegratedChannels::default(),
            reduction_factor: 1,
            warnings: loaded.warnings,
        };
        ds.set_reduction_factor(options.reduction_factor);
        log::info!(
            "{} dataset: {} samples, reduction factor {}, gain {}",
            ds.file_type,
            ds.raw.len(),
            ds.reduction_factor,
            ds.gain()
        );
        ds
    }

    /// Replace this dataset by a fresh load. On failure the dataset is left
    /// empty and unrecognized.
    pub fn reload_from<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        options: &LoadOptions,
    ) -> Result<(), LoadError> {
        match Self::from_reader(reader, options) {
            Ok(ds) => {
                *self = ds;
                Ok(())
            }
            Err(e) => {
                *self = Self::default();
                Err(e)
            }
        }
    }

    /// Move the contents out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    // =====================================================================
    //  Reduction and integration
    // =====================================================================

    /// Apply a new reduction factor and rebuild the reduced and integrated
    /// stages. Invalid factors are corrected and recorded as a warning.
    pub fn set_reduction_factor(&mut self, requested: i64) {
        let (factor, warning) = check_reduction_factor(requested, self.data_length());
        if let Some(w) = warning {
            w.report(&mut self.warnings);
        }
        self.reduction_factor = factor;
        self.reduced = reduce_channels(&self.raw, factor.max(1) as usize);
        self.integrate_all();
    }

    fn integrate_all(&mut self) {
        let (min, max) = self.x_range();
        let whole = IntegrationWindow::new(min, max);
        for channel in Channel::ALL {
            let y = self.reduced.y(channel);
            let series = if y.is_empty() {
                XySeries::default()
            } else {
                trapezoid_cumulative(&self.reduced.x, y, &whole)
            };
            *self.integrated.get_mut(channel) = series;
        }
    }

    /// Warning for a window that lies outside the x range, if any.
    pub fn window_warning(&self, window: &IntegrationWindow) -> Option<EsrWarning> {
        window.check_bounds(self.x_range()).err()
    }

    /// Cumulative integral of a reduced channel over `window`. Out-of-range
    /// windows give an empty series and add a warning to the dataset.
    pub fn integrated_part(&mut self, window: &IntegrationWindow, channel: Channel) -> XySeries {
        match window.check_bounds(self.x_range()) {
            Ok(w) => trapezoid_cumulative(&self.reduced.x, self.reduced.y(channel), &w),
            Err(warning) => {
                warning.report(&mut self.warnings);
                XySeries::default()
            }
        }
    }

    /// Sum of the cumulative integral over `window`.
    pub fn integrate(&mut self, window: &IntegrationWindow, channel: Channel) -> f64 {
        self.integrated_part(window, channel).sum()
    }

    // =====================================================================
    //  Accessors
    // =====================================================================

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn header(&self) -> &StructuredHeader {
        &self.header
    }

    pub fn raw_header(&self) -> &RawHeader {
        &self.raw_header
    }

    pub fn data_length(&self) -> i64 {
        self.header.data_length()
    }

    pub fn reduction_factor(&self) -> i64 {
        self.reduction_factor
    }

    pub fn gain(&self) -> f64 {
        self.header.gain()
    }

    pub fn x_range(&self) -> (f64, f64) {
        self.header.x_range()
    }

    pub fn y_range(&self) -> (f64, f64) {
        self.header.y_range()
    }

    pub fn date(&self) -> &str {
        self.header.date()
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.header.general.timestamp()
    }

    /// Every non-fatal problem seen so far, oldest first.
    pub fn warnings(&self) -> &[EsrWarning] {
        &self.warnings
    }

    pub fn raw(&self) -> &Channels {
        &self.raw
    }

    pub fn reduced(&self) -> &Channels {
        &self.reduced
    }

    pub fn integrated(&self, channel: Channel) -> &XySeries {
        self.integrated.get(channel)
    }

    /// Owned `(x, y)` copy of one channel at one stage.
    pub fn series(&self, stage: Stage, channel: Channel) -> XySeries {
        match stage {
            Stage::Raw => self.raw.series(channel),
            Stage::Reduced => self.reduced.series(channel),
            Stage::Integrated => self.integrated.get(channel).clone(),
        }
    }

    // =====================================================================
    //  Export and diagnostics
    // =====================================================================

    /// Write the raw header and raw samples as an archive.
    pub fn write_archive<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write_archive_with(writer, &JsonArchiveCodec)
    }

    pub fn write_archive_with<W: Write, C: ArchiveCodec + ?Sized>(
        &self,
        writer: &mut W,
        codec: &C,
    ) -> io::Result<()> {
        codec.encode(writer, &self.raw_header, &RawSamples::from(&self.raw))
    }

    pub fn save_archive(&self, path: &Path) -> Result<(), AnalysisError> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_archive(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// x and y ranges with their widths.
    pub fn range_summary(&self) -> String {
        let (x0, x1) = self.x_range();
        let (y0, y1) = self.y_range();
        format!(
            "Data range-------\nx:from {}\tto\t{}\t(width: {})\ny:from {}\tto\t{}\t(width: {})\n",
            x0,
            x1,
            x1 - x0,
            y0,
            y1,
            y1 - y0
        )
    }
}

impl fmt::Display for EsrDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        writeln!(f, "file path: {}", path)?;
        writeln!(f, "file type: {}", self.file_type)?;
        writeln!(f, "data length: {}", self.data_length())?;
        writeln!(f, "reduction factor: {}", self.reduction_factor)?;
        writeln!(f, "gain: {}", self.gain())?;
        write!(f, "{}", self.range_summary())
    }
}
