//! Client for the Xianyu auto-dispatch admin console.
//!
//! Talks to the console backend over REST: admin login, linked-account
//! management, and the QR-code flow that links a new marketplace account.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use xianyu_admin::prelude::*;
//!
//! # async fn example() -> xianyu_admin::error::Result<()> {
//! let config = ConsoleConfig::from_env()?;
//! let client = ApiClient::new(&config, config.auth_context()?)?;
//!
//! let backend = Arc::new(HttpQrLoginBackend::new(client.clone(), &config.qr_login));
//! let controller = QrLoginController::new(backend, config.qr_login.clone());
//! let sink: LoginEventSink = Arc::new(|event: LoginEvent| println!("{}", event.state));
//! let outcome = controller.start(Some(sink)).wait().await;
//!
//! if outcome.is_success() {
//!     for account in Accounts::new(client).list().await? {
//!         println!("{}", account.display_name());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod prelude;
pub mod qr_login;

#[cfg(feature = "cli")]
pub mod cli;
