use std::sync::{Arc, Mutex, MutexGuard};

use super::backend::QrLoginBackend;
use super::flow::{start_login_flow, LoginCanceller, LoginEventSink, LoginHandle};
use super::types::FlowId;
use crate::config::QrLoginConfig;

/// Owner of the single "current login flow" slot.
///
/// Starting a flow cancels whichever flow the controller held before, so at
/// most one poller runs per controller. One controller per login dialog.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use xianyu_admin::config::ConsoleConfig;
/// use xianyu_admin::http::ApiClient;
/// use xianyu_admin::qr_login::{HttpQrLoginBackend, QrLoginController};
///
/// # async fn example() -> xianyu_admin::error::Result<()> {
/// let config = ConsoleConfig::from_env()?;
/// let client = ApiClient::new(&config, config.auth_context()?)?;
/// let backend = Arc::new(HttpQrLoginBackend::new(client, &config.qr_login));
/// let controller = QrLoginController::new(backend, config.qr_login.clone());
/// let outcome = controller.start(None).wait().await;
/// println!("{}", outcome.resolution);
/// # Ok(())
/// # }
/// ```
pub struct QrLoginController {
    backend: Arc<dyn QrLoginBackend>,
    config: QrLoginConfig,
    current: Mutex<Option<LoginCanceller>>,
}

impl std::fmt::Debug for QrLoginController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrLoginController")
            .field("config", &self.config)
            .field("current", &self.current_flow())
            .finish()
    }
}

impl QrLoginController {
    pub fn new(backend: Arc<dyn QrLoginBackend>, config: QrLoginConfig) -> Self {
        Self {
            backend,
            config,
            current: Mutex::new(None),
        }
    }

    /// Start a fresh flow, superseding the current one.
    ///
    /// May be called from a flow's sink, e.g. to retry on `Expired`.
    pub fn start(&self, sink: Option<LoginEventSink>) -> LoginHandle {
        // Cancel outside the slot lock: a sink of the cancelled flow may be
        // calling back into this controller.
        let previous = self.slot().take();
        if let Some(previous) = previous {
            supersede(&previous);
        }
        let handle = start_login_flow(self.backend.clone(), &self.config, sink);
        let displaced = self.slot().replace(handle.canceller());
        if let Some(displaced) = displaced {
            supersede(&displaced);
        }
        handle
    }

    /// Cancel the current flow (dialog dismissed). Returns whether a live
    /// flow was discarded.
    pub fn cancel(&self) -> bool {
        let current = self.slot().take();
        current.map(|flow| flow.cancel()).unwrap_or(false)
    }

    /// Id of the flow currently owned, if it is still running.
    pub fn current_flow(&self) -> Option<FlowId> {
        self.slot()
            .as_ref()
            .filter(|flow| !flow.is_finished())
            .map(LoginCanceller::flow_id)
    }

    pub fn is_active(&self) -> bool {
        self.current_flow().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<LoginCanceller>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn supersede(flow: &LoginCanceller) {
    if flow.cancel() {
        tracing::debug!(flow_id = %flow.flow_id(), "superseded login flow");
    }
}

impl Drop for QrLoginController {
    fn drop(&mut self) {
        self.cancel();
    }
}
