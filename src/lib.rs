//! ESR spectrum analysis: load any supported spectrometer export, reduce it,
//! and integrate it, recording every step in a reproducibility log.

pub mod config;
pub mod data;
pub mod error;
pub mod log;
pub mod pipeline;

pub use config::LoadOptions;
pub use data::dataset::EsrDataset;
pub use data::series::{Channel, Channels, Stage, XySeries};
pub use error::AnalysisError;
pub use pipeline::integrate::IntegrationWindow;
