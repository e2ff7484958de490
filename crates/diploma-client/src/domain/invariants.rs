//! # Domain Invariants
//!
//! Rules every observable session must satisfy.

use thiserror::Error;

use super::entities::{ConnectionState, Role, Session};

/// A broken session rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionViolation {
    #[error("role {0} granted to a session that is not connected")]
    RoleWithoutConnection(Role),

    #[error("disconnected session still holds an identity")]
    DisconnectedWithIdentity,

    #[error("connected session has no identity")]
    ConnectedWithoutIdentity,
}

/// Invariant: a role other than `None` is only held by a connected session.
pub fn invariant_role_requires_connection(session: &Session) -> Result<(), SessionViolation> {
    if session.role() != Role::None && !session.is_connected() {
        return Err(SessionViolation::RoleWithoutConnection(session.role()));
    }
    Ok(())
}

/// Invariant: identity is present exactly when the state says so.
///
/// `Connecting` may carry the previous identity or none.
pub fn invariant_identity_matches_state(session: &Session) -> Result<(), SessionViolation> {
    match (session.state(), session.identity()) {
        (ConnectionState::Disconnected, Some(_)) => Err(SessionViolation::DisconnectedWithIdentity),
        (ConnectionState::Connected, None) => Err(SessionViolation::ConnectedWithoutIdentity),
        _ => Ok(()),
    }
}

/// Check all session invariants.
pub fn invariant_session_consistent(session: &Session) -> Result<(), SessionViolation> {
    invariant_role_requires_connection(session)?;
    invariant_identity_matches_state(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Identity;

    fn id() -> Identity {
        Identity::new("0xabc").unwrap()
    }

    #[test]
    fn test_constructed_sessions_are_consistent() {
        let sessions = [
            Session::disconnected(),
            Session::connecting(None),
            Session::connecting(Some(id())),
            Session::connected(id(), Role::Issuer),
            Session::connected(id(), Role::None),
        ];
        for session in &sessions {
            assert!(invariant_session_consistent(session).is_ok(), "{:?}", session);
        }
    }

    #[test]
    fn test_connecting_never_holds_role() {
        let session = Session::connecting(Some(id()));
        assert_eq!(invariant_role_requires_connection(&session), Ok(()));
        assert_eq!(session.role(), Role::None);
    }
}
