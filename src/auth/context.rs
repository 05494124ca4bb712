//! Credential context shared by every request the client makes.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use super::credentials::Credentials;
use super::store::CredentialStore;
use crate::error::Result;

/// Whether the console currently holds an accepted credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedIn,
    LoggedOut,
}

/// Explicit credential holder passed into the API client.
///
/// Holds the in-memory credential, optionally mirrors it into a
/// [`CredentialStore`], and broadcasts [`AuthState`] changes. Any 401 seen by
/// the client calls [`AuthContext::invalidate`], which flips subscribers to
/// [`AuthState::LoggedOut`].
///
/// A credential installed with [`AuthContext::override_credentials`] is not
/// the one in the store, so rejecting it leaves the stored credential alone.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

struct Inner {
    credentials: RwLock<Option<Credentials>>,
    store: Option<Arc<dyn CredentialStore>>,
    profile: String,
    /// In-memory credential came from an override, not from the store.
    overridden: AtomicBool,
    state_tx: watch::Sender<AuthState>,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("profile", &self.inner.profile)
            .field("logged_in", &self.is_logged_in())
            .field("store", &self.inner.store.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AuthContext {
    /// Context with no persistence; useful for tests and one-shot tokens.
    pub fn in_memory(credentials: Option<Credentials>) -> Self {
        Self::build(credentials, None, "default".to_string())
    }

    /// Context backed by a store; the stored credential (if any) is loaded now.
    pub fn with_store(store: Arc<dyn CredentialStore>, profile: impl Into<String>) -> Result<Self> {
        let profile = profile.into();
        let credentials = store.load(&profile)?;
        Ok(Self::build(credentials, Some(store), profile))
    }

    /// Replace the in-memory credential without touching the store.
    pub fn override_credentials(self, credentials: Credentials) -> Self {
        if let Ok(mut guard) = self.inner.credentials.write() {
            *guard = Some(credentials);
        }
        self.inner.overridden.store(true, Ordering::SeqCst);
        self.inner.state_tx.send_replace(AuthState::LoggedIn);
        self
    }

    fn build(
        credentials: Option<Credentials>,
        store: Option<Arc<dyn CredentialStore>>,
        profile: String,
    ) -> Self {
        let initial = if credentials.is_some() {
            AuthState::LoggedIn
        } else {
            AuthState::LoggedOut
        };
        let (state_tx, _) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                credentials: RwLock::new(credentials),
                store,
                profile,
                overridden: AtomicBool::new(false),
                state_tx,
            }),
        }
    }

    pub fn profile(&self) -> &str {
        &self.inner.profile
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.inner.credentials.read().ok()?.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials().is_some()
    }

    /// Authorization header value for the current credential.
    pub fn authorization(&self) -> Option<String> {
        self.credentials().map(|c| c.authorization_header())
    }

    /// Install a freshly issued credential and persist it.
    pub fn establish(&self, credentials: Credentials) -> Result<()> {
        if let Some(store) = &self.inner.store {
            store.save(&self.inner.profile, &credentials)?;
        }
        if let Ok(mut guard) = self.inner.credentials.write() {
            *guard = Some(credentials);
        }
        self.inner.overridden.store(false, Ordering::SeqCst);
        self.inner.state_tx.send_replace(AuthState::LoggedIn);
        Ok(())
    }

    /// Drop the rejected credential and signal logout.
    ///
    /// The store is cleared only when it holds the credential that was in
    /// use. Store failures are logged, not returned: the logout signal must
    /// fire regardless.
    pub fn invalidate(&self) {
        let overridden = self.inner.overridden.swap(false, Ordering::SeqCst);
        if overridden {
            tracing::debug!(profile = %self.inner.profile, "override rejected; keeping stored credential");
        }
        self.sign_out(!overridden);
    }

    /// Drop the credential from memory and the store, then signal logout.
    pub fn forget(&self) {
        self.inner.overridden.store(false, Ordering::SeqCst);
        self.sign_out(true);
    }

    fn sign_out(&self, clear_store: bool) {
        if let Ok(mut guard) = self.inner.credentials.write() {
            *guard = None;
        }
        if let Some(store) = self.inner.store.as_ref().filter(|_| clear_store) {
            if let Err(err) = store.clear(&self.inner.profile) {
                tracing::warn!(error = %err, "failed to clear stored credential");
            }
        }
        let previous = self.inner.state_tx.send_replace(AuthState::LoggedOut);
        if previous == AuthState::LoggedIn {
            tracing::info!(profile = %self.inner.profile, "console session logged out");
        }
    }

    /// Subscribe to login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    pub fn state(&self) -> AuthState {
        *self.inner.state_tx.borrow()
    }
}
