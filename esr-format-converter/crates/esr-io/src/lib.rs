//! ESR file I/O: format detection, header parsing, sample extraction, and
//! the archive container.
//!
//! [`load`] is the entry point: it classifies a seekable stream, parses
//! the header for that layout, extracts the raw channels, and collects
//! non-fatal [`EsrWarning`]s alongside the result.

pub mod archive;
pub mod binary;
pub mod detect;
pub mod error;
pub mod load;
pub mod samples;
pub mod text;

pub use archive::*;
pub use detect::*;
pub use error::*;
pub use load::*;
pub use samples::*;
