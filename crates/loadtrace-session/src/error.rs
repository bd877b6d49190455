use loadtrace_driver::DriverError;
use thiserror::Error;

/// Failures that end a session without a report.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("config file could not be parsed: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    #[error("browser driver failed: {0}")]
    Driver(#[from] DriverError),
}
