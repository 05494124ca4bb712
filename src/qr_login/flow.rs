//! The login flow task: initiate, poll, deliver transitions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::backend::QrLoginBackend;
use super::error::LoginError;
use super::types::{
    FlowId, LoginEvent, LoginOutcome, LoginResolution, LoginSession, LoginState, PollStatus,
};
use crate::config::QrLoginConfig;

/// Callback receiving state transitions.
///
/// Invoked while the flow's emission lock is held. Cancelling from inside the
/// sink is allowed, directly or by starting a new flow on the owning
/// [`QrLoginController`](super::QrLoginController); [`LoginHandle::state`]
/// and [`LoginHandle::session`] of the same flow must not be called from it.
pub type LoginEventSink = Arc<dyn Fn(LoginEvent) + Send + Sync>;

/// Handle for an in-flight login flow.
///
/// Dropping the handle detaches from the flow without stopping it; call
/// [`LoginHandle::cancel`] to discard it.
#[derive(Debug)]
pub struct LoginHandle {
    flow_id: FlowId,
    canceller: LoginCanceller,
    result_rx: oneshot::Receiver<LoginOutcome>,
}

impl LoginHandle {
    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// Last state delivered to the sink, if any.
    pub fn state(&self) -> Option<LoginState> {
        self.canceller.gate.lock().state
    }

    /// Session issued by the backend, once known.
    pub fn session(&self) -> Option<LoginSession> {
        self.canceller.gate.lock().session.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.canceller.is_finished()
    }

    /// Discard the flow. See [`LoginCanceller::cancel`].
    pub fn cancel(&self) -> bool {
        self.canceller.cancel()
    }

    /// Detachable cancel capability for this flow.
    pub fn canceller(&self) -> LoginCanceller {
        self.canceller.clone()
    }

    /// Wait for the flow to finish.
    ///
    /// A flow task that died without reporting (a panicking sink, a runtime
    /// shutting down) resolves as `Failed` unless it had been cancelled.
    pub async fn wait(self) -> LoginOutcome {
        let flow_id = self.flow_id;
        let canceller = self.canceller;
        match self.result_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                let gate = &canceller.gate;
                let session = gate.lock().session.clone();
                if gate.cancelled.load(Ordering::SeqCst) {
                    let resolution = LoginResolution::Cancelled;
                    return LoginOutcome::new(flow_id, resolution, session, None, 0);
                }
                tracing::warn!(%flow_id, "login flow task ended without an outcome");
                LoginOutcome::new(
                    flow_id,
                    LoginResolution::Failed,
                    session,
                    Some(LoginError::Interrupted(
                        "login flow stopped unexpectedly".to_string(),
                    )),
                    0,
                )
            }
        }
    }
}

/// Cancel capability shared with whoever owns the "current flow" slot.
#[derive(Debug, Clone)]
pub struct LoginCanceller {
    flow_id: FlowId,
    gate: Arc<Gate>,
    token: CancellationToken,
}

impl LoginCanceller {
    pub fn flow_id(&self) -> FlowId {
        self.flow_id
    }

    /// Discard the flow.
    ///
    /// Once this returns, no further event reaches the sink and no further
    /// status request is issued; a response already in flight is dropped on
    /// arrival. Returns `false` if the flow had already finished or been
    /// cancelled.
    pub fn cancel(&self) -> bool {
        if self.gate.is_closed() {
            return false;
        }
        let cancelled = if self.gate.delivering_on_current_thread() {
            // Re-entered from this flow's sink: the emission lock is held
            // further up this stack and is released once the sink returns.
            !self.gate.cancelled.swap(true, Ordering::SeqCst)
        } else {
            let _state = self.gate.lock();
            !self.gate.finished.load(Ordering::SeqCst)
                && !self.gate.cancelled.swap(true, Ordering::SeqCst)
        };
        if cancelled {
            self.token.cancel();
            tracing::debug!(flow_id = %self.flow_id, "login flow cancelled");
        }
        cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.gate.is_closed()
    }
}

#[derive(Debug, Default)]
struct GateState {
    state: Option<LoginState>,
    session: Option<LoginSession>,
    seq: u64,
}

/// Serialises state delivery against cancellation.
///
/// `cancelled` and `finished` only change while `inner` is held (or from the
/// sink, which runs under it), so readers may check them without locking.
#[derive(Debug, Default)]
struct Gate {
    inner: Mutex<GateState>,
    cancelled: AtomicBool,
    finished: AtomicBool,
    delivering: Mutex<Option<ThreadId>>,
}

impl Gate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        // A panicking sink poisons the lock; the state itself stays coherent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.finished.load(Ordering::SeqCst) || self.cancelled.load(Ordering::SeqCst)
    }

    fn delivering_on_current_thread(&self) -> bool {
        let delivering = self.delivering.lock().unwrap_or_else(|e| e.into_inner());
        *delivering == Some(thread::current().id())
    }

    fn enter_delivery(&self) -> DeliveryGuard<'_> {
        *self.delivering.lock().unwrap_or_else(|e| e.into_inner()) = Some(thread::current().id());
        DeliveryGuard { gate: self }
    }
}

/// Marks the current thread as running the sink until dropped.
struct DeliveryGuard<'a> {
    gate: &'a Gate,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        *self.gate.delivering.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

struct Emitter {
    flow_id: FlowId,
    gate: Arc<Gate>,
    sink: Option<LoginEventSink>,
}

impl Emitter {
    /// Apply a transition unless the flow was cancelled.
    ///
    /// Returns `false` when the transition was discarded.
    fn transition(&self, next: LoginState, session: Option<&LoginSession>) -> bool {
        let mut gate = self.gate.lock();
        if self.gate.is_closed() {
            return false;
        }
        if !LoginState::allows(gate.state, next) {
            tracing::warn!(
                flow_id = %self.flow_id,
                from = ?gate.state,
                to = %next,
                "ignoring illegal login state transition"
            );
            return false;
        }
        gate.state = Some(next);
        if let Some(session) = session {
            gate.session = Some(session.clone());
        }
        if next.is_terminal() {
            self.gate.finished.store(true, Ordering::SeqCst);
        }
        gate.seq += 1;
        let event = LoginEvent {
            flow_id: self.flow_id,
            seq: gate.seq,
            timestamp: chrono::Utc::now(),
            state: next,
            session_id: gate.session.as_ref().map(|s| s.session_id.clone()),
            code_reference: gate.session.as_ref().map(|s| s.code_reference.clone()),
        };
        if let Some(sink) = &self.sink {
            let _delivering = self.gate.enter_delivery();
            (sink)(event);
        }
        true
    }
}

/// Start a login flow on the current tokio runtime.
///
/// The flow enters `Pending`, requests a session, enters `Waiting` with the
/// code reference, then polls every `config.poll_interval` until a terminal
/// status, the optional `config.max_wait` deadline, or cancellation.
pub fn start_login_flow(
    backend: Arc<dyn QrLoginBackend>,
    config: &QrLoginConfig,
    sink: Option<LoginEventSink>,
) -> LoginHandle {
    let flow_id = Uuid::new_v4();
    let gate = Arc::new(Gate::default());
    let token = CancellationToken::new();
    let (result_tx, result_rx) = oneshot::channel();

    let emitter = Emitter {
        flow_id,
        gate: gate.clone(),
        sink,
    };
    let task = FlowTask {
        backend,
        config: config.clone(),
        emitter,
        token: token.clone(),
        polls: 0,
    };
    tokio::spawn(async move {
        let outcome = task.run().await;
        tracing::info!(
            flow_id = %outcome.flow_id,
            resolution = %outcome.resolution,
            polls = outcome.polls,
            "login flow finished"
        );
        let _ = result_tx.send(outcome);
    });

    LoginHandle {
        flow_id,
        canceller: LoginCanceller {
            flow_id,
            gate,
            token,
        },
        result_rx,
    }
}

struct FlowTask {
    backend: Arc<dyn QrLoginBackend>,
    config: QrLoginConfig,
    emitter: Emitter,
    token: CancellationToken,
    polls: u32,
}

impl FlowTask {
    async fn run(mut self) -> LoginOutcome {
        if !self.emitter.transition(LoginState::Pending, None) {
            return self.cancelled(None);
        }

        let created = tokio::select! {
            biased;
            _ = self.token.cancelled() => return self.cancelled(None),
            result = self.backend.create_session() => result,
        };
        let session = match created {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(flow_id = %self.emitter.flow_id, error = %err, "QR login initiation failed");
                return self.terminal(LoginState::Error, None, Some(err));
            }
        };
        if !self.emitter.transition(LoginState::Waiting, Some(&session)) {
            return self.cancelled(Some(session));
        }
        tracing::debug!(
            flow_id = %self.emitter.flow_id,
            session_id = %session.session_id,
            "QR code issued; polling"
        );

        let deadline = self.config.max_wait.map(|wait| Instant::now() + wait);
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return self.cancelled(Some(session)),
                _ = sleep_until_deadline(deadline) => {
                    tracing::info!(
                        flow_id = %self.emitter.flow_id,
                        session_id = %session.session_id,
                        "QR code not confirmed before client deadline"
                    );
                    return self.terminal(LoginState::Expired, Some(session), Some(LoginError::SessionExpired));
                }
                _ = time::sleep(self.config.poll_interval) => {}
            }

            self.polls += 1;
            let polled = tokio::select! {
                biased;
                _ = self.token.cancelled() => None,
                result = self.backend.poll_status(&session.session_id) => Some(result),
            };
            let Some(polled) = polled else {
                return self.cancelled(Some(session));
            };
            tracing::debug!(
                flow_id = %self.emitter.flow_id,
                poll = self.polls,
                status = ?polled,
                "QR login status"
            );

            match polled {
                Ok(PollStatus::Waiting) => continue,
                Ok(PollStatus::Success) => {
                    return self.terminal(LoginState::Success, Some(session), None)
                }
                Ok(PollStatus::Expired) => {
                    return self.terminal(
                        LoginState::Expired,
                        Some(session),
                        Some(LoginError::SessionExpired),
                    )
                }
                Ok(PollStatus::Error) => {
                    return self.terminal(
                        LoginState::Error,
                        Some(session),
                        Some(LoginError::RejectedByBackend(
                            "session reported error status".to_string(),
                        )),
                    )
                }
                Err(err) => {
                    tracing::warn!(flow_id = %self.emitter.flow_id, error = %err, "QR login poll failed");
                    return self.terminal(LoginState::Error, Some(session), Some(err));
                }
            }
        }
    }

    fn terminal(
        &self,
        state: LoginState,
        session: Option<LoginSession>,
        error: Option<LoginError>,
    ) -> LoginOutcome {
        if !self.emitter.transition(state, session.as_ref()) {
            return self.cancelled(session);
        }
        let resolution = match state {
            LoginState::Success => LoginResolution::Success,
            LoginState::Expired => LoginResolution::Expired,
            _ => LoginResolution::Failed,
        };
        LoginOutcome::new(self.emitter.flow_id, resolution, session, error, self.polls)
    }

    fn cancelled(&self, session: Option<LoginSession>) -> LoginOutcome {
        LoginOutcome::new(
            self.emitter.flow_id,
            LoginResolution::Cancelled,
            session,
            None,
            self.polls,
        )
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
