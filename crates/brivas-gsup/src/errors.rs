//! Error types for GSUP message construction

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, GsupError>;

/// Top-level GSUP error
#[derive(Debug, Error)]
pub enum GsupError {
    /// `build()` was called before a message type was set
    #[error("Incomplete message: msg_type is required")]
    IncompleteMessage,

    #[error("Malformed attachment for IE '{name}': {reason}")]
    MalformedAttachment {
        name: String,
        reason: String,
    },

    #[error("Unknown message type: {0}")]
    UnknownMsgType(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GsupError {
    pub(crate) fn malformed(name: &str, reason: impl Into<String>) -> Self {
        Self::MalformedAttachment {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Misuse errors are surfaced to the caller and never retried
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::IncompleteMessage | Self::MalformedAttachment { .. } | Self::UnknownMsgType(_)
        )
    }
}

impl From<config::ConfigError> for GsupError {
    fn from(err: config::ConfigError) -> Self {
        GsupError::Config(err.to_string())
    }
}
