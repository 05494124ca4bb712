#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use xianyu_admin::qr_login::{
    LoginError, LoginEvent, LoginEventSink, LoginSession, LoginState, PollStatus, QrLoginBackend,
};

/// Pauses a backend call until the test releases it.
#[derive(Default)]
pub struct Hold {
    pub started: Notify,
    pub release: Notify,
}

/// In-memory backend answering from scripted queues.
///
/// Sessions default to `s1`, `s2`, ... once the scripted ones run out;
/// statuses default to `waiting`.
#[derive(Default)]
pub struct ScriptedBackend {
    sessions: Mutex<VecDeque<Result<LoginSession, LoginError>>>,
    statuses: Mutex<VecDeque<Result<PollStatus, LoginError>>>,
    create_calls: AtomicU32,
    poll_calls: AtomicU32,
    polled_ids: Mutex<Vec<String>>,
    hold_creates: Option<Arc<Hold>>,
    hold_polls: Option<Arc<Hold>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(statuses: impl IntoIterator<Item = PollStatus>) -> Self {
        let backend = Self::new();
        for status in statuses {
            backend.push_status(Ok(status));
        }
        backend
    }

    pub fn hold_creates(mut self, hold: Arc<Hold>) -> Self {
        self.hold_creates = Some(hold);
        self
    }

    pub fn hold_polls(mut self, hold: Arc<Hold>) -> Self {
        self.hold_polls = Some(hold);
        self
    }

    pub fn push_session(&self, session: Result<LoginSession, LoginError>) {
        self.sessions.lock().unwrap().push_back(session);
    }

    pub fn push_status(&self, status: Result<PollStatus, LoginError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn create_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn polled_ids(&self) -> Vec<String> {
        self.polled_ids.lock().unwrap().clone()
    }

    pub fn polls_for(&self, session_id: &str) -> usize {
        self.polled_ids()
            .iter()
            .filter(|id| id.as_str() == session_id)
            .count()
    }
}

#[async_trait]
impl QrLoginBackend for ScriptedBackend {
    async fn create_session(&self) -> Result<LoginSession, LoginError> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hold) = &self.hold_creates {
            hold.started.notify_one();
            hold.release.notified().await;
        }
        let scripted = self.sessions.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(session(&format!("s{n}"))))
    }

    async fn poll_status(&self, session_id: &str) -> Result<PollStatus, LoginError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polled_ids
            .lock()
            .unwrap()
            .push(session_id.to_string());
        if let Some(hold) = &self.hold_polls {
            hold.started.notify_one();
            hold.release.notified().await;
        }
        let scripted = self.statuses.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(PollStatus::Waiting))
    }
}

pub fn session(id: &str) -> LoginSession {
    LoginSession {
        session_id: id.to_string(),
        code_reference: format!("https://x/qr-{id}"),
    }
}

/// Sink that records every delivered event.
pub fn recorder() -> (LoginEventSink, Arc<Mutex<Vec<LoginEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: LoginEventSink = Arc::new(move |event: LoginEvent| {
        sink_events.lock().unwrap().push(event);
    });
    (sink, events)
}

pub fn states(events: &Arc<Mutex<Vec<LoginEvent>>>) -> Vec<LoginState> {
    events.lock().unwrap().iter().map(|e| e.state).collect()
}
