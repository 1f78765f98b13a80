//! CLI-specific error types and exit code mapping

use pwa_report_core::error::ReportError;
use pwa_report_engine::EngineError;
use pwa_report_probes::ProbeError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The analysis finished but the site cannot be packaged yet.
    #[error("not packageable: {0}")]
    NotPackageable(String),

    /// Tracing subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from pwa-report-core.
    #[error("{0}")]
    Core(#[from] ReportError),

    /// Analysis engine error.
    #[error("analysis error: {0}")]
    Engine(#[from] EngineError),

    /// Probe construction error.
    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 4    | Site is not packageable        |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(ReportError::Config(_)) => 2,
            Self::NotPackageable(_) => 4,
            Self::Io(_) | Self::Core(ReportError::Io(_)) => 10,
            Self::Command(_)
            | Self::Logging(_)
            | Self::JsonSerialize(_)
            | Self::Core(_)
            | Self::Engine(_)
            | Self::Probe(_) => 1,
        }
    }
}
