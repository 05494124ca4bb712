use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bearer credential for the admin console backend.
///
/// # Example
/// ```no_run
/// use xianyu_admin::auth::Credentials;
///
/// let creds = Credentials::bearer("token-from-login").with_username("admin");
/// assert_eq!(creds.username.as_deref(), Some("admin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: None,
            issued_at: Some(Utc::now()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
