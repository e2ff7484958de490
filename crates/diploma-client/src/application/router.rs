//! # Role Router
//!
//! Chooses the dashboard to show for a session.

use tokio::sync::watch;

use crate::domain::{ConnectionState, Role, Session};

/// The dashboard selected for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardView {
    /// Ask the user to connect a wallet.
    ConnectPrompt,
    AdminView,
    IssuerView,
    VerifierView,
    /// Connected, but the identity has no role.
    UnauthorizedPrompt,
}

impl DashboardView {
    /// Prompt text for the non-dashboard views.
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            DashboardView::ConnectPrompt => Some("Please connect your wallet."),
            DashboardView::UnauthorizedPrompt => Some("No role is associated with this wallet."),
            _ => None,
        }
    }
}

/// Select the view for a session. Pure and total.
pub fn select_view(session: &Session) -> DashboardView {
    match (session.state(), session.role()) {
        (ConnectionState::Disconnected | ConnectionState::Connecting, _) => {
            DashboardView::ConnectPrompt
        }
        (ConnectionState::Connected, Role::Admin) => DashboardView::AdminView,
        (ConnectionState::Connected, Role::Issuer) => DashboardView::IssuerView,
        (ConnectionState::Connected, Role::Verifier) => DashboardView::VerifierView,
        (ConnectionState::Connected, Role::None) => DashboardView::UnauthorizedPrompt,
    }
}

/// Follows a session channel and re-selects the view on every change.
pub struct DashboardSelector {
    session: watch::Receiver<Session>,
}

impl DashboardSelector {
    pub fn new(session: watch::Receiver<Session>) -> Self {
        Self { session }
    }

    /// View for the latest session.
    pub fn current(&self) -> DashboardView {
        select_view(&self.session.borrow())
    }

    /// Wait for the next session change and return the view for it.
    ///
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<DashboardView> {
        self.session.changed().await.ok()?;
        Some(select_view(&self.session.borrow_and_update()))
    }
}
