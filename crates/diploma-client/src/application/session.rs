//! # Session Store
//!
//! Single source of truth for who is acting and with what role.
//!
//! The session lives in a `watch` channel: readers see every mutation as
//! soon as it is made, and only this store writes to it. Connect attempts
//! are serialized by the `Connecting` state itself; an attempt is also
//! tagged with a ticket so a `disconnect()` issued mid-flight wins over the
//! late signer reply.
//!
//! Snapshot writes happen inside the channel update that publishes the
//! matching session, so storage follows the same order as the session.

use async_trait::async_trait;
use diploma_telemetry::{log_event, metric_inc, SESSION_CONNECTS};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::domain::{
    invariant_session_consistent, ConnectError, Identity, Role, Session, StorageError,
};
use crate::ports::inbound::SessionControl;
use crate::ports::outbound::{
    RoleResolver, SessionStorage, Signer, USER_ROLE_KEY, WALLET_ADDRESS_KEY,
};

const COMPONENT: &str = "session";

/// Session Store - owns the session and its persisted snapshot.
pub struct SessionStore {
    state: watch::Sender<Session>,
    /// Bumped by every connect attempt and every disconnect.
    attempt: AtomicU64,
    signer: Option<Arc<dyn Signer>>,
    resolver: Arc<dyn RoleResolver>,
    storage: Arc<dyn SessionStorage>,
    reverify_on_restore: bool,
}

impl SessionStore {
    /// Create a store with an empty session.
    ///
    /// `signer` is `None` when no wallet capability is installed.
    pub fn new(
        signer: Option<Arc<dyn Signer>>,
        resolver: Arc<dyn RoleResolver>,
        storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let (state, _) = watch::channel(Session::disconnected());
        Self {
            state,
            attempt: AtomicU64::new(0),
            signer,
            resolver,
            storage,
            reverify_on_restore: true,
        }
    }

    /// Apply the session section of the configuration.
    pub fn configured(mut self, config: &SessionConfig) -> Self {
        self.reverify_on_restore = config.reverify_on_restore;
        self
    }

    /// Trust the persisted role on restore instead of re-resolving it.
    pub fn with_reverify_on_restore(mut self, enabled: bool) -> Self {
        self.reverify_on_restore = enabled;
        self
    }

    /// Request an identity from the signer and connect.
    pub async fn connect(&self) -> Result<Session, ConnectError> {
        let Some(signer) = self.signer.clone() else {
            metric_inc!(SESSION_CONNECTS, &["no_signer"]);
            log_event!(warn, COMPONENT, "Connect failed: no wallet signer available");
            return Err(ConnectError::NoSignerAvailable);
        };

        let Some(attempt) = self.begin_attempt() else {
            metric_inc!(SESSION_CONNECTS, &["in_progress"]);
            log_event!(debug, COMPONENT, "Connect rejected: attempt already in flight");
            return Err(ConnectError::ConnectInProgress);
        };

        let accounts = match signer.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                let err = ConnectError::from(e);
                metric_inc!(SESSION_CONNECTS, &[connect_outcome(&err)]);
                log_event!(warn, COMPONENT, "Connect failed", error = %err);
                drop(attempt);
                return Err(err);
            }
        };

        let Some(identity) = accounts.into_iter().next().and_then(Identity::new) else {
            let err = ConnectError::SignerError("no accounts returned".to_string());
            metric_inc!(SESSION_CONNECTS, &["signer_error"]);
            log_event!(warn, COMPONENT, "Connect failed", error = %err);
            drop(attempt);
            return Err(err);
        };

        let role = self.resolver.resolve(&identity);
        let session = Session::connected(identity, role);

        if !attempt.finish(session.clone()) {
            metric_inc!(SESSION_CONNECTS, &["cancelled"]);
            log_event!(info, COMPONENT, "Connect superseded by disconnect");
            return Err(ConnectError::Cancelled);
        }

        metric_inc!(SESSION_CONNECTS, &["connected"]);
        log_event!(
            info,
            COMPONENT,
            "Wallet connected",
            identity = %identity_label(&session),
            role = %role
        );
        Ok(session)
    }

    /// Clear the session and erase the snapshot. Idempotent.
    pub fn disconnect(&self) {
        let changed = self.state.send_if_modified(|session| {
            self.attempt.fetch_add(1, Ordering::SeqCst);
            self.erase();
            let changed = *session != Session::disconnected();
            *session = Session::disconnected();
            changed
        });

        if changed {
            log_event!(info, COMPONENT, "Wallet disconnected");
        }
    }

    /// Rebuild the session from the snapshot without contacting the signer.
    ///
    /// A malformed snapshot (blank address, unknown role) resets the session
    /// and erases storage; unreadable storage is cleared. An in-flight connect
    /// attempt is left alone, and a connect or disconnect that lands while
    /// the snapshot is read takes precedence.
    pub fn restore(&self) -> Session {
        let ticket = self.attempt.load(Ordering::SeqCst);
        let current = self.current();
        if current.is_connecting() {
            return current;
        }

        let (address, stored_role) = match self.read_snapshot() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return self.commit(ticket, Session::disconnected(), SnapshotWrite::Keep);
            }
            Err(e) => {
                log_event!(warn, COMPONENT, "Unreadable session snapshot, clearing", error = %e);
                return self.commit(ticket, Session::disconnected(), SnapshotWrite::Clear);
            }
        };

        let parsed = Identity::new(address.as_str()).zip(Role::parse(&stored_role));
        let Some((identity, stored_role)) = parsed else {
            log_event!(
                warn,
                COMPONENT,
                "Discarding invalid session snapshot",
                wallet_address = %address,
                user_role = %stored_role
            );
            return self.commit(ticket, Session::disconnected(), SnapshotWrite::Erase);
        };

        let role = if self.reverify_on_restore {
            self.resolver.resolve(&identity)
        } else {
            stored_role
        };

        let write = if role != stored_role {
            log_event!(
                info,
                COMPONENT,
                "Persisted role is stale, replacing",
                stored = %stored_role,
                resolved = %role
            );
            SnapshotWrite::Persist
        } else {
            SnapshotWrite::Keep
        };

        let session = self.commit(ticket, Session::connected(identity, role), write);
        log_event!(debug, COMPONENT, "Session restored", state = ?session.state());
        session
    }

    /// Current session.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Current identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    // -------------------------------------------------------------------------
    // Internal
    // -------------------------------------------------------------------------

    /// Move to `Connecting` unless an attempt is already in flight.
    fn begin_attempt(&self) -> Option<Attempt<'_>> {
        let mut attempt = None;
        self.state.send_if_modified(|session| {
            if session.is_connecting() {
                return false;
            }
            let ticket = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
            attempt = Some(Attempt {
                store: self,
                ticket,
                previous: Some(session.clone()),
            });
            *session = Session::connecting(session.identity().cloned());
            true
        });
        attempt
    }

    /// Publish `session` and apply `write` unless a connect or disconnect
    /// happened after `ticket` was taken. Returns whether it was applied.
    fn publish(&self, ticket: u64, session: Session, write: SnapshotWrite) -> bool {
        debug_assert!(invariant_session_consistent(&session).is_ok());
        let mut applied = false;
        self.state.send_if_modified(|current| {
            if self.attempt.load(Ordering::SeqCst) != ticket {
                return false;
            }
            applied = true;
            match write {
                SnapshotWrite::Keep => {}
                SnapshotWrite::Persist => self.persist(&session),
                SnapshotWrite::Erase => self.erase(),
                SnapshotWrite::Clear => self.clear(),
            }
            if *current == session {
                return false;
            }
            *current = session;
            true
        });
        applied
    }

    /// `publish` for restore: the resulting session either way.
    fn commit(&self, ticket: u64, session: Session, write: SnapshotWrite) -> Session {
        if self.publish(ticket, session.clone(), write) {
            session
        } else {
            self.current()
        }
    }

    fn read_snapshot(&self) -> Result<Option<(String, String)>, StorageError> {
        let Some(address) = self.storage.get(WALLET_ADDRESS_KEY)? else {
            return Ok(None);
        };
        let role = self.storage.get(USER_ROLE_KEY)?.unwrap_or_default();
        Ok(Some((address, role)))
    }

    fn persist(&self, session: &Session) {
        let Some(snapshot) = session.snapshot() else {
            return;
        };
        let result = self
            .storage
            .set(WALLET_ADDRESS_KEY, &snapshot.wallet_address)
            .and_then(|_| self.storage.set(USER_ROLE_KEY, &snapshot.user_role));
        if let Err(e) = result {
            log_event!(warn, COMPONENT, "Failed to persist session snapshot", error = %e);
        }
    }

    fn erase(&self) {
        for key in [WALLET_ADDRESS_KEY, USER_ROLE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                log_event!(warn, COMPONENT, "Failed to erase session snapshot", key, error = %e);
            }
        }
    }

    fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            log_event!(warn, COMPONENT, "Failed to clear session storage", error = %e);
        }
    }
}

/// Storage side effect applied together with a session change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SnapshotWrite {
    Keep,
    Persist,
    Erase,
    Clear,
}

/// An in-flight connect attempt.
///
/// Dropping it unfinished (error or cancelled future) puts the previous
/// session back.
struct Attempt<'a> {
    store: &'a SessionStore,
    ticket: u64,
    previous: Option<Session>,
}

impl Attempt<'_> {
    /// Publish the connected session and persist its snapshot.
    fn finish(mut self, session: Session) -> bool {
        self.previous = None;
        self.store.publish(self.ticket, session, SnapshotWrite::Persist)
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.store.publish(self.ticket, previous, SnapshotWrite::Keep);
        }
    }
}

fn connect_outcome(err: &ConnectError) -> &'static str {
    match err {
        ConnectError::NoSignerAvailable => "no_signer",
        ConnectError::UserRejected => "rejected",
        ConnectError::SignerError(_) => "signer_error",
        ConnectError::ConnectInProgress => "in_progress",
        ConnectError::Cancelled => "cancelled",
    }
}

fn identity_label(session: &Session) -> String {
    session.identity().map(Identity::short).unwrap_or_default()
}

#[async_trait]
impl SessionControl for SessionStore {
    async fn connect(&self) -> Result<Session, ConnectError> {
        SessionStore::connect(self).await
    }

    fn disconnect(&self) {
        SessionStore::disconnect(self)
    }

    fn restore(&self) -> Session {
        SessionStore::restore(self)
    }

    fn current(&self) -> Session {
        SessionStore::current(self)
    }

    fn subscribe(&self) -> watch::Receiver<Session> {
        SessionStore::subscribe(self)
    }
}
