//! # Session Entities
//!
//! Identity, role and the session tuple held by the session store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying the acting party (a wallet address).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create an identity from a signer-provided handle.
    ///
    /// Returns `None` for blank handles.
    pub fn new(handle: impl Into<String>) -> Option<Self> {
        let handle = handle.into();
        let trimmed = handle.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.len() == handle.len() {
            Some(Self(handle))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display: `0x1234...7890`.
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 10 {
            return self.0.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authorization tier derived from an identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Institution issuing diplomas.
    Issuer,
    /// Party checking diplomas.
    Verifier,
    /// Identity not present in the role directory.
    #[default]
    #[serde(rename = "")]
    None,
}

impl Role {
    /// All privileged roles.
    pub const PRIVILEGED: [Role; 3] = [Role::Admin, Role::Issuer, Role::Verifier];

    /// Persisted string form (empty for `None`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Issuer => "issuer",
            Role::Verifier => "verifier",
            Role::None => "",
        }
    }

    /// Parse the persisted string form. Unknown strings yield `None`
    /// (the Option), not `Role::None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "admin" => Some(Role::Admin),
            "issuer" => Some(Role::Issuer),
            "verifier" => Some(Role::Verifier),
            "" => Some(Role::None),
            _ => None,
        }
    }

    /// Whether this role grants any dashboard.
    pub fn is_privileged(&self) -> bool {
        !matches!(self, Role::None)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::None => f.write_str("none"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Wallet connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No identity.
    #[default]
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// Identity established.
    Connected,
}

/// The runtime tuple of identity, connection state and role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    state: ConnectionState,
    role: Role,
}

impl Session {
    /// Empty, disconnected session.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Connected session for a resolved identity.
    pub fn connected(identity: Identity, role: Role) -> Self {
        Self {
            identity: Some(identity),
            state: ConnectionState::Connected,
            role,
        }
    }

    /// In-flight session. The previous identity (if any) is kept, the role is
    /// withheld until the attempt completes.
    pub fn connecting(previous: Option<Identity>) -> Self {
        Self {
            identity: previous,
            state: ConnectionState::Connecting,
            role: Role::None,
        }
    }

    /// Current identity.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether the session is fully connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether a connect attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        self.state == ConnectionState::Connecting
    }

    /// Persistable snapshot, present only for connected sessions.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        match (&self.identity, self.state) {
            (Some(identity), ConnectionState::Connected) => Some(SessionSnapshot {
                wallet_address: identity.as_str().to_string(),
                user_role: self.role.as_str().to_string(),
            }),
            _ => None,
        }
    }
}

/// Durable form of a connected session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Persisted identity handle.
    pub wallet_address: String,
    /// Persisted role string, empty for `Role::None`.
    pub user_role: String,
}
