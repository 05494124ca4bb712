//! Convenience re-exports for common use.

pub use crate::accounts::{AccountDetail, AccountSettings, Accounts};
pub use crate::auth::{AdminSession, AuthContext, AuthState, Credentials};
pub use crate::config::{ConsoleConfig, QrLoginConfig};
pub use crate::error::{ConsoleError, Result};
pub use crate::http::ApiClient;
pub use crate::qr_login::{
    HttpQrLoginBackend, LoginError, LoginEvent, LoginEventSink, LoginHandle, LoginOutcome,
    LoginResolution, LoginState, QrLoginBackend, QrLoginController,
};
