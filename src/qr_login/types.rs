//! Core types for the QR account-linking flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::error::LoginError;

/// Identifier of one login flow (one "add account" attempt).
pub type FlowId = Uuid;

/// A pending login attempt issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub session_id: String,
    /// URL of the scannable code image.
    pub code_reference: String,
}

/// Observable state of a login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoginState {
    Pending,
    Waiting,
    Success,
    Expired,
    Error,
}

impl LoginState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Expired | Self::Error)
    }

    /// Whether `next` is a legal step from `self` (or from the start when `None`).
    pub fn allows(from: Option<Self>, next: Self) -> bool {
        match (from, next) {
            (None, Self::Pending) => true,
            (Some(Self::Pending), Self::Waiting | Self::Error) => true,
            (Some(Self::Waiting), Self::Success | Self::Expired | Self::Error) => true,
            _ => false,
        }
    }
}

/// Status reported by the backend for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PollStatus {
    Waiting,
    Success,
    Expired,
    Error,
}

/// State transition delivered to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub flow_id: FlowId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub state: LoginState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_reference: Option<String>,
}

/// How a flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoginResolution {
    Success,
    Expired,
    Failed,
    Cancelled,
}

/// Final result of a login flow.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub flow_id: FlowId,
    pub resolution: LoginResolution,
    pub session: Option<LoginSession>,
    pub error: Option<LoginError>,
    /// Number of status requests issued.
    pub polls: u32,
    pub finished_at: DateTime<Utc>,
}

impl LoginOutcome {
    pub(crate) fn new(
        flow_id: FlowId,
        resolution: LoginResolution,
        session: Option<LoginSession>,
        error: Option<LoginError>,
        polls: u32,
    ) -> Self {
        Self {
            flow_id,
            resolution,
            session,
            error,
            polls,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.resolution == LoginResolution::Success
    }

    /// The terminal state this outcome corresponds to; `None` when discarded.
    pub fn final_state(&self) -> Option<LoginState> {
        match self.resolution {
            LoginResolution::Success => Some(LoginState::Success),
            LoginResolution::Expired => Some(LoginState::Expired),
            LoginResolution::Failed => Some(LoginState::Error),
            LoginResolution::Cancelled => None,
        }
    }

    /// Collapse into the linked session or the reason it was not linked.
    pub fn into_result(self) -> Result<LoginSession, LoginError> {
        match self.resolution {
            LoginResolution::Cancelled => Err(LoginError::Cancelled),
            LoginResolution::Success => self.session.ok_or_else(|| {
                LoginError::InitiationFailed("flow succeeded without a session".to_string())
            }),
            LoginResolution::Expired => Err(self.error.unwrap_or(LoginError::SessionExpired)),
            LoginResolution::Failed => Err(self.error.unwrap_or_else(|| {
                LoginError::RejectedByBackend("login failed".to_string())
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn terminal_states() {
        assert!(!LoginState::Pending.is_terminal());
        assert!(!LoginState::Waiting.is_terminal());
        assert!(LoginState::Success.is_terminal());
        assert!(LoginState::Expired.is_terminal());
        assert!(LoginState::Error.is_terminal());
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        assert!(LoginState::allows(None, LoginState::Pending));
        assert!(LoginState::allows(Some(LoginState::Pending), LoginState::Waiting));
        assert!(LoginState::allows(Some(LoginState::Pending), LoginState::Error));
        assert!(LoginState::allows(Some(LoginState::Waiting), LoginState::Expired));

        assert!(!LoginState::allows(None, LoginState::Waiting));
        assert!(!LoginState::allows(Some(LoginState::Pending), LoginState::Success));
        assert!(!LoginState::allows(Some(LoginState::Success), LoginState::Error));
        assert!(!LoginState::allows(Some(LoginState::Expired), LoginState::Waiting));
    }

    #[test]
    fn poll_status_parses_wire_strings() {
        assert_eq!(PollStatus::from_str("waiting").unwrap(), PollStatus::Waiting);
        assert_eq!(PollStatus::from_str("expired").unwrap(), PollStatus::Expired);
        assert!(PollStatus::from_str("scanned").is_err());
        assert_eq!(PollStatus::Success.to_string(), "success");
    }

    #[test]
    fn cancelled_outcome_has_no_final_state() {
        let outcome =
            LoginOutcome::new(Uuid::new_v4(), LoginResolution::Cancelled, None, None, 0);
        assert_eq!(outcome.final_state(), None);
        assert!(matches!(outcome.into_result(), Err(LoginError::Cancelled)));
    }

    #[test]
    fn expired_outcome_maps_to_session_expired() {
        let outcome = LoginOutcome::new(Uuid::new_v4(), LoginResolution::Expired, None, None, 1);
        assert_eq!(outcome.final_state(), Some(LoginState::Expired));
        assert!(matches!(outcome.into_result(), Err(LoginError::SessionExpired)));
    }
}
