//! Errors surfaced by the file-path entry points and exports.

use esr_io::LoadError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),
}
