use thiserror::Error;

use crate::error::ConsoleError;

/// Failures of the QR account-linking flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    /// The backend could not issue a session; retry by starting a new flow.
    #[error("Could not start QR login: {0}")]
    InitiationFailed(String),
    /// A status request failed at transport level (including 401).
    #[error("Lost contact with the login session: {0}")]
    PollTransport(String),
    /// The backend reported `error` for the session.
    #[error("Login rejected by backend: {0}")]
    RejectedByBackend(String),
    #[error("QR code expired")]
    SessionExpired,
    /// The flow task stopped without reporting an outcome.
    #[error("Login flow interrupted: {0}")]
    Interrupted(String),
    #[error("Login cancelled")]
    Cancelled,
}

impl LoginError {
    /// Whether the user can recover by starting a fresh flow.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl From<LoginError> for ConsoleError {
    fn from(error: LoginError) -> Self {
        ConsoleError::Login(error.to_string())
    }
}
