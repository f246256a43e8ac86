use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::AdminConfig;
use crate::error::{AdminResult, AuthFailure};

use super::principal::Role;
use super::provider::{CredentialsProvider, LoginRequest};

/// Authenticated context held between login and logout/401/expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub access_token: String,
    /// Stored for completeness; nothing renews the access token with it.
    pub refresh_token: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|e| now >= e).unwrap_or(false)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Why the last session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Logout,
    Unauthorized,
    Expired,
    Invalidated,
}

#[derive(Default)]
struct Slot {
    session: Option<Session>,
    authenticating: usize,
    last_end: Option<SessionEnd>,
}

impl Slot {
    fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::Authenticated
        } else if self.authenticating > 0 {
            SessionState::Authenticating
        } else {
            SessionState::Unauthenticated
        }
    }
}

struct StoreInner {
    slot: RwLock<Slot>,
    state: watch::Sender<SessionState>,
}

/// The one place the active session lives. Cheap to clone; clones share state.
///
/// Only the session manager establishes sessions. Anyone holding a clone may
/// read the current session or end it.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(SessionState::Unauthenticated);
        Self { inner: Arc::new(StoreInner { slot: RwLock::new(Slot::default()), state }) }
    }

    fn publish(&self, slot: &Slot) {
        let next = slot.state();
        self.inner.state.send_if_modified(|cur| {
            if *cur != next { *cur = next; true } else { false }
        });
    }

    pub fn establish(&self, session: Session) {
        let mut slot = self.inner.slot.write();
        debug!(user_id = %session.user_id, expires_at = ?session.expires_at, "session established");
        slot.session = Some(session);
        slot.last_end = None;
        self.publish(&slot);
    }

    pub(crate) fn begin_authenticating(&self) {
        let mut slot = self.inner.slot.write();
        slot.authenticating += 1;
        self.publish(&slot);
    }

    pub(crate) fn finish_authenticating(&self) {
        let mut slot = self.inner.slot.write();
        slot.authenticating = slot.authenticating.saturating_sub(1);
        self.publish(&slot);
    }

    /// Active, unexpired session. An expired one is ended on the way out.
    pub fn current(&self) -> Option<Session> {
        self.current_at(Utc::now())
    }

    pub fn current_at(&self, now: DateTime<Utc>) -> Option<Session> {
        {
            let slot = self.inner.slot.read();
            match slot.session.as_ref() {
                None => return None,
                Some(s) if !s.is_expired_at(now) => return Some(s.clone()),
                Some(_) => {}
            }
        }
        self.clear_if(SessionEnd::Expired, |s| s.is_expired_at(now));
        None
    }

    pub fn access_token(&self) -> Option<String> {
        self.current().map(|s| s.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// End the session, whatever it is. Idempotent; returns whether one was cleared.
    pub fn invalidate(&self, reason: SessionEnd) -> bool {
        self.clear_if(reason, |_| true)
    }

    fn clear_if<F: Fn(&Session) -> bool>(&self, reason: SessionEnd, pred: F) -> bool {
        let mut slot = self.inner.slot.write();
        let cleared = match slot.session.as_ref() {
            Some(s) if pred(s) => {
                info!(user_id = %s.user_id, ?reason, "session ended");
                slot.session = None;
                slot.last_end = Some(reason);
                true
            }
            _ => false,
        };
        self.publish(&slot);
        cleared
    }

    /// Current lifecycle state. An expired session is ended first.
    pub fn state(&self) -> SessionState {
        self.current();
        *self.inner.state.borrow()
    }

    pub fn last_end(&self) -> Option<SessionEnd> {
        self.inner.slot.read().last_end
    }

    /// Lifecycle notifications for the presentation layer.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }
}

// Keeps the Authenticating count balanced even if the login future is dropped.
struct AuthenticatingGuard<'a>(&'a SessionStore);

impl<'a> AuthenticatingGuard<'a> {
    fn enter(store: &'a SessionStore) -> Self {
        store.begin_authenticating();
        Self(store)
    }
}

impl Drop for AuthenticatingGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_authenticating();
    }
}

/// Owns the login flow and the session store it feeds.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    provider: CredentialsProvider,
}

impl SessionManager {
    pub fn new(config: &AdminConfig) -> AdminResult<Self> {
        Self::with_store(config, SessionStore::new())
    }

    pub fn with_store(config: &AdminConfig, store: SessionStore) -> AdminResult<Self> {
        Ok(Self { store, provider: CredentialsProvider::new(config)? })
    }

    /// Exchange credentials for a session. A failed attempt leaves any existing session alone.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthFailure> {
        let req = LoginRequest::new(email, password);
        let _guard = AuthenticatingGuard::enter(&self.store);
        let session = self.provider.exchange(&req).await?;
        self.store.establish(session.clone());
        Ok(session)
    }

    pub fn current_session(&self) -> Option<Session> {
        self.store.current()
    }

    pub fn invalidate(&self) -> bool {
        self.store.invalidate(SessionEnd::Invalidated)
    }

    pub fn logout(&self) -> bool {
        self.store.invalidate(SessionEnd::Logout)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(token: &str, expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            user_id: "1".into(),
            email: "a@b.com".into(),
            name: "A".into(),
            role: Role::new("admin"),
            access_token: token.into(),
            refresh_token: Some("R1".into()),
            issued_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn establish_then_invalidate() {
        let store = SessionStore::new();
        assert_eq!(store.state(), SessionState::Unauthenticated);
        store.establish(session("T1", None));
        assert_eq!(store.state(), SessionState::Authenticated);
        assert_eq!(store.access_token().as_deref(), Some("T1"));
        assert!(store.invalidate(SessionEnd::Logout));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(store.last_end(), Some(SessionEnd::Logout));
        assert!(store.current().is_none());
    }

    #[test]
    fn invalidate_is_idempotent() {
        let store = SessionStore::new();
        store.establish(session("T1", None));
        assert!(store.invalidate(SessionEnd::Invalidated));
        assert!(!store.invalidate(SessionEnd::Invalidated));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert!(!SessionStore::new().invalidate(SessionEnd::Invalidated));
    }

    #[test]
    fn expired_session_is_ended_on_read() {
        let store = SessionStore::new();
        let now = Utc::now();
        store.establish(session("T1", Some(now + Duration::seconds(60))));
        assert!(store.current_at(now).is_some());
        assert!(store.current_at(now + Duration::seconds(61)).is_none());
        assert_eq!(store.last_end(), Some(SessionEnd::Expired));
        assert_eq!(store.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn state_settles_expiry() {
        let store = SessionStore::new();
        store.establish(session("T1", Some(Utc::now() - Duration::seconds(1))));
        assert_eq!(store.state(), SessionState::Unauthenticated);
        assert_eq!(store.last_end(), Some(SessionEnd::Expired));
    }

    #[test]
    fn authenticating_state_is_balanced() {
        let store = SessionStore::new();
        {
            let _g = AuthenticatingGuard::enter(&store);
            assert_eq!(store.state(), SessionState::Authenticating);
        }
        assert_eq!(store.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn clones_share_state_and_notify() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        let other = store.clone();
        other.establish(session("T1", None));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::Authenticated);
        store.invalidate(SessionEnd::Unauthorized);
        assert_eq!(*rx.borrow_and_update(), SessionState::Unauthenticated);
        // A second invalidate publishes nothing new.
        store.invalidate(SessionEnd::Unauthorized);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn debug_hides_tokens() {
        let s = format!("{:?}", session("secret-token", None));
        assert!(!s.contains("secret-token"));
        assert!(!s.contains("R1"));
    }
}
