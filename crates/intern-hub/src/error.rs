//! Process-level failures surfaced by the CLI and server entry points.
//!
//! HTTP handlers never see these; request errors go through `PipelineError`.

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::intake::CandidateImportError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("candidate upload rejected: {0}")]
    Import(#[from] CandidateImportError),
}
