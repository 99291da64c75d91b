use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Process-level failures: startup, wiring and offline commands.
///
/// Request-level report failures are typed separately and never reach this enum.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report export could not be parsed: {0}")]
    Export(#[from] serde_json::Error),
    #[error("http client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}
