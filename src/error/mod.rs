//! Error types for the admin console client.

use thiserror::Error;

/// Primary error type for all console operations.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Credential file error: {0}")]
    CredentialFile(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Login flow error: {0}")]
    Login(String),
}

impl From<toml::de::Error> for ConsoleError {
    fn from(error: toml::de::Error) -> Self {
        Self::CredentialFile(error.to_string())
    }
}

impl From<toml::ser::Error> for ConsoleError {
    fn from(error: toml::ser::Error) -> Self {
        Self::CredentialFile(error.to_string())
    }
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    Unknown,
}

impl ConsoleError {
    /// Create an API error from a status code and body text.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) => ErrorCategory::Authentication,
            Self::Network(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) | Self::CredentialFile(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is potentially retryable by the user.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Whether this error means the stored credential is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.category(), ErrorCategory::Authentication)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = ConsoleError::api(404, "Not found");
        assert!(matches!(&err, ConsoleError::Api { status: 404, .. }));
        assert_eq!(err.to_string(), "API error (status 404): Not found");
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(ConsoleError::api(503, "busy").is_retryable());
        assert_eq!(ConsoleError::api(500, "boom").category(), ErrorCategory::Server);
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!ConsoleError::api(400, "bad").is_retryable());
        assert!(!ConsoleError::Configuration("x".to_string()).is_retryable());
    }

    #[test]
    fn unauthorized_and_forbidden_classify_as_authentication() {
        assert!(ConsoleError::Unauthorized("expired".to_string()).is_unauthorized());
        assert!(ConsoleError::api(403, "nope").is_unauthorized());
        assert!(!ConsoleError::api(404, "gone").is_unauthorized());
    }

    #[test]
    fn invalid_response_classifies_as_serialization() {
        let err = ConsoleError::InvalidResponse("missing field".to_string());
        assert_eq!(err.category(), ErrorCategory::Serialization);
    }
}
