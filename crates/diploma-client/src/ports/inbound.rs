//! # Inbound Ports
//!
//! What the rest of the client can ask of the session store.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{ConnectError, Identity, Session};

/// Session API - inbound port.
///
/// Only implementors mutate the session; every other component reads it
/// through `current()` or a `subscribe()` receiver.
#[async_trait]
pub trait SessionControl: Send + Sync {
    /// Ask the signer for an identity and establish a connected session.
    async fn connect(&self) -> Result<Session, ConnectError>;

    /// Clear the session and erase the persisted snapshot. Idempotent.
    fn disconnect(&self);

    /// Rebuild the session from the persisted snapshot, if any.
    fn restore(&self) -> Session;

    /// Current session.
    fn current(&self) -> Session;

    /// Receiver notified on every session change.
    fn subscribe(&self) -> watch::Receiver<Session>;

    /// Current identity, if any.
    fn identity(&self) -> Option<Identity> {
        self.current().identity().cloned()
    }
}
