//! # Admin Overview
//!
//! Administrator view-model: platform statistics and account management.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use super::require_connected;
use crate::domain::{
    endpoints_for_role, AdminStats, EndpointInfo, FlowError, Role, Session, UserAccount,
    UserStatus,
};
use crate::ports::outbound::DiplomaApi;

/// Accounts per role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleCounts {
    pub admin: usize,
    pub issuer: usize,
    pub verifier: usize,
    pub none: usize,
}

impl RoleCounts {
    pub fn total(&self) -> usize {
        self.admin + self.issuer + self.verifier + self.none
    }
}

/// Administrator view-model.
pub struct AdminOverview {
    api: Arc<dyn DiplomaApi>,
    session: watch::Receiver<Session>,
    stats: Option<AdminStats>,
    users: Vec<UserAccount>,
    last_error: Option<FlowError>,
}

impl AdminOverview {
    pub fn new(api: Arc<dyn DiplomaApi>, session: watch::Receiver<Session>) -> Self {
        Self {
            api,
            session,
            stats: None,
            users: Vec::new(),
            last_error: None,
        }
    }

    /// Fetch statistics and the account list concurrently.
    ///
    /// Both must succeed for the cache to be replaced.
    pub async fn refresh(&mut self) -> Result<(), FlowError> {
        require_connected(&self.session)?;

        let (stats, users) = tokio::join!(self.api.admin_stats(), self.api.admin_users());
        match stats.and_then(|stats| users.map(|users| (stats, users))) {
            Ok((stats, users)) => {
                self.stats = Some(stats);
                self.users = users;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("[diploma] Admin overview refresh failed: {}", e);
                let err = FlowError::Api(e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Activate or deactivate an account.
    pub async fn set_user_status(
        &mut self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<(), FlowError> {
        require_connected(&self.session)?;

        if let Err(e) = self.api.update_user_status(user_id, status).await {
            let err = FlowError::Api(e);
            self.last_error = Some(err.clone());
            return Err(err);
        }

        if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
            user.status = status;
        }
        info!(user_id, ?status, "[diploma] User status updated");
        Ok(())
    }

    pub fn stats(&self) -> Option<&AdminStats> {
        self.stats.as_ref()
    }

    pub fn users(&self) -> &[UserAccount] {
        &self.users
    }

    pub fn role_counts(&self) -> RoleCounts {
        self.users
            .iter()
            .fold(RoleCounts::default(), |mut counts, user| {
                match user.role {
                    Role::Admin => counts.admin += 1,
                    Role::Issuer => counts.issuer += 1,
                    Role::Verifier => counts.verifier += 1,
                    Role::None => counts.none += 1,
                }
                counts
            })
    }

    /// Endpoints an administrator may call.
    pub fn accessible_endpoints(&self) -> Vec<&'static EndpointInfo> {
        endpoints_for_role(Role::Admin)
    }

    /// Error banner of the last attempt.
    pub fn last_error(&self) -> Option<&FlowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }
}
