//! Error types for the offset workflow.

/// Offset workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum OffsetError {
    /// Inbound request failed validation; no network call was made.
    #[error("{message}")]
    Validation { message: String },

    /// Marketplace rejected the private key.
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Non-2xx response from a remote endpoint.
    #[error("HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Transport failure (connect, timeout, TLS, body read).
    #[error("network error: {message}")]
    Network { message: String },

    /// 2xx response whose body did not match the expected schema.
    #[error("invalid response: {message}")]
    Decode { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl OffsetError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 1,
            Self::Config { .. } => 1,

            Self::Unauthorized { .. } => 4,

            Self::Api { .. } => 5,
            Self::Network { .. } => 5,

            Self::Decode { .. } => 6,
        }
    }
}

impl From<reqwest::Error> for OffsetError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for offset operations.
pub type OffsetResult<T> = Result<T, OffsetError>;
