//! Console credentials, persistence, and the logout signal.

pub mod context;
pub mod credentials;
pub mod service;
pub mod store;

pub use context::{AuthContext, AuthState};
pub use credentials::Credentials;
pub use service::AdminSession;
pub use store::{CredentialStore, FileCredentialStore};
