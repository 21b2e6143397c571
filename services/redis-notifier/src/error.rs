//! Error types for the redis notifier

/// Errors that can occur while watching a connection and delivering alerts
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Alert delivery failed: {0}")]
    Delivery(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, NotifierError>;
