//! Session initiator and status poller endpoints.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::LoginError;
use super::types::{LoginSession, PollStatus};
use crate::config::QrLoginConfig;
use crate::http::{is_path_segment, ApiClient};

/// The two backend calls the login flow is built on.
#[async_trait]
pub trait QrLoginBackend: Send + Sync {
    /// Ask the backend for a new session and its scannable code.
    async fn create_session(&self) -> Result<LoginSession, LoginError>;

    /// Query the status of a session issued by [`QrLoginBackend::create_session`].
    async fn poll_status(&self, session_id: &str) -> Result<PollStatus, LoginError>;
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    qr_code_url: Option<String>,
    session_id: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

/// [`QrLoginBackend`] over the console REST API.
#[derive(Debug, Clone)]
pub struct HttpQrLoginBackend {
    client: ApiClient,
    generate_path: String,
    check_path: String,
}

impl HttpQrLoginBackend {
    pub fn new(client: ApiClient, config: &QrLoginConfig) -> Self {
        Self {
            client,
            generate_path: config.generate_path.clone(),
            check_path: config.check_path.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QrLoginBackend for HttpQrLoginBackend {
    async fn create_session(&self) -> Result<LoginSession, LoginError> {
        let resp: GenerateResponse = self
            .client
            .post::<(), _>(&self.generate_path, None)
            .await
            .map_err(|e| LoginError::InitiationFailed(e.to_string()))?;
        session_from_response(resp)
    }

    async fn poll_status(&self, session_id: &str) -> Result<PollStatus, LoginError> {
        if !is_path_segment(session_id) {
            return Err(LoginError::PollTransport(format!(
                "invalid session id: {session_id:?}"
            )));
        }
        let path = format!("{}/{}", self.check_path, session_id);
        let resp: StatusResponse = self
            .client
            .get(&path)
            .await
            .map_err(|e| LoginError::PollTransport(e.to_string()))?;
        let status = PollStatus::from_str(resp.status.trim()).map_err(|_| {
            LoginError::PollTransport(format!("unrecognised session status '{}'", resp.status))
        })?;
        if status == PollStatus::Error {
            if let Some(message) = resp.message {
                tracing::debug!(session_id, %message, "backend reported session error");
            }
        }
        Ok(status)
    }
}

fn session_from_response(resp: GenerateResponse) -> Result<LoginSession, LoginError> {
    if !resp.success {
        return Err(LoginError::InitiationFailed(
            resp.message
                .unwrap_or_else(|| "backend reported failure".to_string()),
        ));
    }
    match (resp.session_id, resp.qr_code_url) {
        (Some(session_id), Some(code_reference))
            if !session_id.is_empty() && !code_reference.is_empty() =>
        {
            Ok(LoginSession {
                session_id,
                code_reference,
            })
        }
        _ => Err(LoginError::InitiationFailed(
            "response is missing session_id or qr_code_url".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<LoginSession, LoginError> {
        session_from_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn successful_response_yields_session() {
        let session = parse(json!({
            "success": true,
            "qr_code_url": "https://x/qr1",
            "session_id": "s1"
        }))
        .unwrap();
        assert_eq!(session.session_id, "s1");
        assert_eq!(session.code_reference, "https://x/qr1");
    }

    #[test]
    fn unsuccessful_response_carries_backend_message() {
        let err = parse(json!({ "success": false, "message": "browser pool busy" })).unwrap_err();
        assert_eq!(err, LoginError::InitiationFailed("browser pool busy".to_string()));
    }

    #[test]
    fn missing_fields_fail_initiation() {
        let err = parse(json!({ "success": true, "session_id": "s1" })).unwrap_err();
        assert!(matches!(err, LoginError::InitiationFailed(_)));
        let err = parse(json!({ "success": true, "session_id": "", "qr_code_url": "u" }))
            .unwrap_err();
        assert!(matches!(err, LoginError::InitiationFailed(_)));
    }
}
