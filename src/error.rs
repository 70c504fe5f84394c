use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweetspotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Scoring service error: {0}")]
    ScoringService(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

impl SweetspotError {
    /// Whether the bounded retry policy may try the failed step again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SweetspotError::Transcode(_))
    }
}

pub type Result<T> = std::result::Result<T, SweetspotError>;
