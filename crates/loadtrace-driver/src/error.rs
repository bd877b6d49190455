use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("driver failed to launch: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script injection failed: {0}")]
    Script(String),

    #[error("{0} is not available from the driver")]
    Unavailable(&'static str),

    #[error("page has not been navigated yet")]
    NotNavigated,

    #[error("driver is closed")]
    Closed,

    #[error("invalid recording: {0}")]
    Recording(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
