//! QR-code account linking.
//!
//! A flow asks the backend for a login session, hands the scannable code to
//! the caller, and polls the session until the backend reports a terminal
//! status or the caller cancels:
//!
//! ```text
//! [start] --create ok--> Waiting --success--> Success
//!                        Waiting --expired--> Expired
//!                        Waiting --error----> Error
//! [start] --create failed--------------------> Error
//! any non-terminal --cancel--> discarded
//! ```

pub mod backend;
pub mod controller;
pub mod error;
pub mod flow;
pub mod types;

pub use backend::{HttpQrLoginBackend, QrLoginBackend};
pub use controller::QrLoginController;
pub use error::LoginError;
pub use flow::{start_login_flow, LoginCanceller, LoginEventSink, LoginHandle};
pub use types::{
    FlowId, LoginEvent, LoginOutcome, LoginResolution, LoginSession, LoginState, PollStatus,
};
