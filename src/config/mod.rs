//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::store::default_home_dir;
use crate::auth::{AuthContext, Credentials, FileCredentialStore};
use crate::error::{ConsoleError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5 * 60);

/// Connection settings for the admin console backend.
///
/// Resolution order:
/// 1. Values set in code (`with_*` builders)
/// 2. Environment variables (`XIANYU_ADMIN_*`, `.env` honoured)
/// 3. Built-in defaults
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Token that bypasses the credential store when set.
    pub token: Option<String>,
    pub home_dir: PathBuf,
    pub profile: String,
    pub qr_login: QrLoginConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            token: None,
            home_dir: default_home_dir(),
            profile: "default".to_string(),
            qr_login: QrLoginConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables (XIANYU_ADMIN_URL, XIANYU_ADMIN_TOKEN, ...).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup("XIANYU_ADMIN_URL") {
            config.base_url = url;
        }
        if let Some(token) = lookup("XIANYU_ADMIN_TOKEN").filter(|t| !t.trim().is_empty()) {
            config.token = Some(token);
        }
        if let Some(raw) = lookup("XIANYU_ADMIN_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConsoleError::Configuration(format!(
                    "XIANYU_ADMIN_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(home) = lookup("XIANYU_ADMIN_HOME") {
            config.home_dir = PathBuf::from(home);
        }
        if let Some(profile) = lookup("XIANYU_ADMIN_PROFILE") {
            config.profile = profile;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.home_dir = dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_qr_login(mut self, qr_login: QrLoginConfig) -> Self {
        self.qr_login = qr_login;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::Configuration(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ConsoleError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the credential context this config describes.
    ///
    /// The file store under `home_dir` is always attached so logins persist;
    /// an explicit `token` only overrides what is held in memory.
    pub fn auth_context(&self) -> Result<AuthContext> {
        let store = Arc::new(FileCredentialStore::new(self.home_dir.clone()));
        let ctx = AuthContext::with_store(store, self.profile.clone())?;
        Ok(match &self.token {
            Some(token) => ctx.override_credentials(Credentials::bearer(token.clone())),
            None => ctx,
        })
    }
}

/// Timing and endpoint settings for the QR account-linking flow.
#[derive(Debug, Clone)]
pub struct QrLoginConfig {
    /// Delay between successive status polls.
    pub poll_interval: Duration,
    /// Client-side deadline measured from the moment the code is shown.
    /// `None` polls until the backend reports a terminal status.
    pub max_wait: Option<Duration>,
    pub generate_path: String,
    /// Status path prefix; the session id is appended as the last segment.
    pub check_path: String,
}

impl Default for QrLoginConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: Some(DEFAULT_MAX_WAIT),
            generate_path: "/api/qr-login/generate".to_string(),
            check_path: "/api/qr-login/check".to_string(),
        }
    }
}

impl QrLoginConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.qr_login.poll_interval, Duration::from_secs(2));
        assert_eq!(config.qr_login.max_wait, Some(Duration::from_secs(300)));
        assert!(config.token.is_none());
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[
            ("XIANYU_ADMIN_URL", "https://console.example"),
            ("XIANYU_ADMIN_TOKEN", "env-token"),
            ("XIANYU_ADMIN_TIMEOUT_SECS", "5"),
            ("XIANYU_ADMIN_HOME", "/tmp/xy"),
            ("XIANYU_ADMIN_PROFILE", "staging"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://console.example");
        assert_eq!(config.token.as_deref(), Some("env-token"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.home_dir, PathBuf::from("/tmp/xy"));
        assert_eq!(config.profile, "staging");
    }

    #[test]
    fn blank_token_is_ignored() {
        let config =
            ConsoleConfig::from_lookup(lookup_from(&[("XIANYU_ADMIN_TOKEN", "  ")])).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        let err = ConsoleConfig::from_lookup(lookup_from(&[("XIANYU_ADMIN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Configuration(msg) if msg.contains("soon")));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let err = ConsoleConfig::new("ftp://nope").validate().unwrap_err();
        assert!(matches!(err, ConsoleError::Configuration(_)));
    }

    #[test]
    fn explicit_token_overrides_stored_credential() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().to_path_buf());
        crate::auth::CredentialStore::save(&store, "default", &Credentials::bearer("stored"))
            .unwrap();

        let config = ConsoleConfig::default().with_home_dir(dir.path());
        assert_eq!(config.auth_context().unwrap().credentials().unwrap().token, "stored");

        let config = config.with_token("explicit");
        assert_eq!(config.auth_context().unwrap().credentials().unwrap().token, "explicit");
    }
}
