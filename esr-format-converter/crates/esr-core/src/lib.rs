//! ESR core types: raw key/value header, typed header elements, and gain.
//!
//! Every supported spectrometer layout is first reduced to a [`RawHeader`]
//! (string keys exactly as they appear in the source file). The typed
//! [`StructuredHeader`] is derived from it once and never fails: fields
//! that are absent or unparseable fall back to zero or an empty string.

pub mod elements;
pub mod enums;
pub mod header;
pub mod raw;

pub use elements::*;
pub use enums::*;
pub use header::*;
pub use raw::*;
