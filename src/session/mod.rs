//! Client-side session state
//!
//! [`SessionState`] is the single source of truth for "is a user signed in".
//! It owns the in-memory session, mirrors every change to the durable store
//! and publishes each new snapshot on a watch channel so consumers can react
//! without polling.
//!
//! None of the session operations fail from the caller's point of view:
//! store and network problems are logged and the in-memory state still
//! changes. The one exception is [`SessionState::sign_in`], whose service
//! error a sign-in prompt has to show.

mod bootstrap;
mod renewer;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use futures::stream::{self, BoxStream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::sync::watch;

use crate::client::{AuthApi, Identity};
use crate::error::Result;
use crate::store::{CredentialStore, Slot};

pub use renewer::{CredentialRenewer, RenewalPolicy};

/// Snapshot of the client-held session.
///
/// `identity` and `access` are either both present or both absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub access: Option<String>,
    pub renewal: Option<String>,
    /// Set once bootstrap has run. Before that the session is unknown, not
    /// signed out.
    pub ready: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.access.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.identity.as_ref().is_some_and(Identity::is_admin)
    }

    fn clear_credentials(&mut self) -> bool {
        let changed = self.identity.is_some() || self.access.is_some() || self.renewal.is_some();
        self.identity = None;
        self.access = None;
        self.renewal = None;
        changed
    }
}

/// Owned, injectable session state shared by the renewer and the executor
pub struct SessionState {
    state: watch::Sender<Session>,
    store: Arc<dyn CredentialStore>,
    auth: Arc<dyn AuthApi>,
    bootstrap_started: AtomicBool,
}

impl SessionState {
    /// Create an empty, not-yet-ready session
    pub fn new(store: Arc<dyn CredentialStore>, auth: Arc<dyn AuthApi>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            state,
            store,
            auth,
            bootstrap_started: AtomicBool::new(false),
        }
    }

    /// Authentication service used for sign-in, sign-out and renewal
    pub fn auth(&self) -> &Arc<dyn AuthApi> {
        &self.auth
    }

    /// Clone of the current session
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn access(&self) -> Option<String> {
        self.state.borrow().access.clone()
    }

    pub fn renewal(&self) -> Option<String> {
        self.state.borrow().renewal.clone()
    }

    /// Receiver that observes every session change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Stream of session snapshots, one per change after the call
    pub fn changes(&self) -> BoxStream<'static, Session> {
        let rx = self.state.subscribe();
        stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let session = rx.borrow_and_update().clone();
            Some((session, rx))
        })
        .boxed()
    }

    /// Suspend until bootstrap has completed
    pub async fn wait_ready(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so this only ends once ready is set
        let _ = rx.wait_for(|session| session.ready).await;
    }

    /// Replace the whole session with a new identity and credentials.
    ///
    /// No validation of token shape is done. Present values are persisted;
    /// an absent renewal credential is dropped from memory but any stored one
    /// is left in place.
    pub fn login(&self, identity: Identity, access: String, renewal: Option<String>) {
        self.persist_identity(&identity);
        self.persist(Slot::Access, &access);
        if let Some(ref renewal) = renewal {
            self.persist(Slot::Renewal, renewal);
        }

        log::info!(
            "Signed in as {} (access {})",
            identity.username,
            fingerprint(&access)
        );
        self.state.send_modify(|session| {
            session.identity = Some(identity);
            session.access = Some(access);
            session.renewal = renewal;
        });
    }

    /// Authenticate against the service, then [`login`](Self::login) with the grant
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<Identity> {
        let grant = self.auth.login(login, password).await?;
        if let Some(message) = grant.message.as_deref() {
            log::debug!("Login response: {}", message);
        }
        let identity = grant.user.clone();
        self.login(grant.user, grant.access_token, grant.refresh_token);
        Ok(identity)
    }

    /// Sign out locally, after a best-effort notification to the service.
    ///
    /// The notification result never changes the outcome: memory and store
    /// are always cleared.
    pub async fn logout(&self) {
        if let Some(access) = self.access() {
            if let Err(e) = self.auth.logout(&access).await {
                log::warn!("Logout notification failed: {}", e);
            }
        }

        self.state.send_if_modified(Session::clear_credentials);
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear stored session: {}", e);
        }
        log::info!("Signed out");
    }

    /// Store the result of a successful renewal.
    ///
    /// Keeps the current renewal credential unless a new one was issued.
    pub(crate) fn apply_renewal(
        &self,
        identity: Identity,
        access: String,
        renewal: Option<String>,
    ) {
        self.persist_identity(&identity);
        self.persist(Slot::Access, &access);
        if let Some(ref renewal) = renewal {
            self.persist(Slot::Renewal, renewal);
        }

        log::debug!("Access credential renewed ({})", fingerprint(&access));
        self.state.send_modify(|session| {
            session.identity = Some(identity);
            session.access = Some(access);
            if renewal.is_some() {
                session.renewal = renewal;
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn replace_for_test(&self, session: Session) {
        self.state.send_replace(session);
    }

    fn persist_identity(&self, identity: &Identity) {
        match serde_json::to_string(identity) {
            Ok(json) => self.persist(Slot::Identity, &json),
            Err(e) => log::warn!("Failed to serialize identity: {}", e),
        }
    }

    fn persist(&self, slot: Slot, value: &str) {
        if let Err(e) = self.store.write(slot, value) {
            log::warn!("Failed to persist {}: {}", slot, e);
        }
    }
}

/// Short, non-reversible tag for a credential, safe to log or print
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let hex: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("sha256:{}", hex)
}
