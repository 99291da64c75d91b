use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_UPLOAD_PRESET: &str = "clear-view-preset";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_SUBMISSION_BYTES: usize = 20 * 1024 * 1024;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub integrations: IntegrationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = match non_empty_var("APP_LOG_FORMAT") {
            Some(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat)?,
            None if environment == AppEnvironment::Production => LogFormat::Json,
            None => LogFormat::Compact,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            integrations: IntegrationConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Line format for emitted log events. Production defaults to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Endpoints for the photo upload and image classification collaborators.
///
/// Both endpoints are optional: without an upload endpoint photo submissions are
/// refused, and without a classifier every photo is left for manual review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationConfig {
    pub upload_url: Option<String>,
    pub upload_preset: String,
    pub classifier_url: Option<String>,
    pub classifier_top_k: Option<usize>,
    pub http_timeout: Duration,
    /// Largest accepted submission body, base64 photo included.
    pub max_submission_bytes: usize,
}

impl IntegrationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let upload_url = non_empty_var("CLEARVIEW_UPLOAD_URL");
        let upload_preset = non_empty_var("CLEARVIEW_UPLOAD_PRESET")
            .unwrap_or_else(|| DEFAULT_UPLOAD_PRESET.to_string());
        let classifier_url = non_empty_var("CLEARVIEW_CLASSIFIER_URL");

        let classifier_top_k = match non_empty_var("CLEARVIEW_CLASSIFIER_TOP_K") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => Some(value),
                _ => return Err(ConfigError::InvalidTopK),
            },
            None => None,
        };

        let timeout_secs = match non_empty_var("CLEARVIEW_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout)?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let max_submission_bytes = match non_empty_var("CLEARVIEW_MAX_SUBMISSION_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::InvalidSubmissionLimit),
            },
            None => DEFAULT_MAX_SUBMISSION_BYTES,
        };

        Ok(Self {
            upload_url,
            upload_preset,
            classifier_url,
            classifier_top_k,
            http_timeout: Duration::from_secs(timeout_secs),
            max_submission_bytes,
        })
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            upload_url: None,
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            classifier_url: None,
            classifier_top_k: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_submission_bytes: DEFAULT_MAX_SUBMISSION_BYTES,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLogFormat,
    InvalidTopK,
    InvalidTimeout,
    InvalidSubmissionLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLogFormat => {
                write!(f, "APP_LOG_FORMAT must be either 'compact' or 'json'")
            }
            ConfigError::InvalidTopK => {
                write!(f, "CLEARVIEW_CLASSIFIER_TOP_K must be a positive integer")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "CLEARVIEW_HTTP_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidSubmissionLimit => {
                write!(f, "CLEARVIEW_MAX_SUBMISSION_BYTES must be a positive byte count")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidLogFormat
            | ConfigError::InvalidTopK
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidSubmissionLimit => None,
        }
    }
}
