//! # Application Layer
//!
//! The session store and the view-models built on top of it.

pub mod admin;
pub mod client;
pub mod debounce;
pub mod history;
pub mod issuance;
pub mod router;
pub mod session;
pub mod verification;

pub use admin::{AdminOverview, RoleCounts};
pub use client::{ClientError, DiplomaClient};
pub use debounce::Debouncer;
pub use history::{Criterion, DateRange, HistoryFilter, HistoryView, StatusFilter};
pub use issuance::DiplomaCreationFlow;
pub use router::{select_view, DashboardSelector, DashboardView};
pub use session::SessionStore;
pub use verification::{ProofStatus, VerificationFlow, VerificationOutcome};

use tokio::sync::watch;

use crate::domain::{FlowError, Identity, Session};

/// Gate for privileged actions: the identity of a connected session.
pub(crate) fn require_connected(session: &watch::Receiver<Session>) -> Result<Identity, FlowError> {
    let session = session.borrow();
    match session.identity() {
        Some(identity) if session.is_connected() => Ok(identity.clone()),
        _ => Err(FlowError::NotConnected),
    }
}
