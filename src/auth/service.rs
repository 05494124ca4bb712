use serde::{Deserialize, Serialize};

use super::credentials::Credentials;
use crate::error::{ConsoleError, Result};
use crate::http::ApiClient;

const LOGIN_PATH: &str = "/api/login";
const VERIFY_PATH: &str = "/api/verify";

/// Admin console login, verification and logout.
///
/// All I/O decisions (printing, prompting, exit codes) belong to the caller.
///
/// # Example
/// ```no_run
/// use xianyu_admin::auth::AdminSession;
/// use xianyu_admin::config::ConsoleConfig;
/// use xianyu_admin::http::ApiClient;
///
/// # async fn example() -> xianyu_admin::error::Result<()> {
/// let config = ConsoleConfig::from_env()?;
/// let client = ApiClient::new(&config, config.auth_context()?)?;
/// AdminSession::new(client).login("admin", "secret").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AdminSession {
    client: ApiClient,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    message: Option<String>,
}

impl AdminSession {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange username/password for a bearer token and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ConsoleError::InvalidArgument(
                "username and password are required".to_string(),
            ));
        }
        let body = LoginRequest { username, password };
        let resp: LoginResponse = self.client.post(LOGIN_PATH, Some(&body)).await?;
        match resp.token.filter(|t| !t.is_empty()) {
            Some(token) if resp.success => {
                let creds = Credentials::bearer(token).with_username(username);
                self.client.auth().establish(creds.clone())?;
                tracing::info!(username, "admin login succeeded");
                Ok(creds)
            }
            _ => Err(ConsoleError::Unauthorized(
                resp.message.unwrap_or_else(|| "login failed".to_string()),
            )),
        }
    }

    /// Check the current credential against the backend.
    ///
    /// Returns `Ok(false)` when there is no credential or the backend answers
    /// 401 (in which case the credential is also cleared). Other failures
    /// propagate.
    pub async fn verify(&self) -> Result<bool> {
        if !self.client.auth().is_logged_in() {
            return Ok(false);
        }
        match self.client.get::<serde_json::Value>(VERIFY_PATH).await {
            Ok(_) => Ok(true),
            Err(ConsoleError::Unauthorized(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Forget the local credential, including the stored one.
    pub fn logout(&self) {
        self.client.auth().forget();
    }
}
