//! Endpoint registry for the diploma backend.
//!
//! Every outbound call goes through one of these endpoints. Each carries the
//! role expected to call it; enforcement is the backend's job, the client
//! uses it for logging and to tag metrics.

use std::fmt;

use super::entities::Role;

/// HTTP verb of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static endpoint metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    /// Short name (e.g. "verify_diploma")
    pub name: &'static str,
    /// HTTP verb
    pub method: HttpMethod,
    /// Path template relative to the base URL
    pub template: &'static str,
    /// Role expected to call this endpoint (`None` = any caller)
    pub role: Option<Role>,
}

impl EndpointInfo {
    const fn new(
        name: &'static str,
        method: HttpMethod,
        template: &'static str,
        role: Option<Role>,
    ) -> Self {
        Self {
            name,
            method,
            template,
            role,
        }
    }

    /// Label used for metrics: `"GET /auth/verify"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.template)
    }
}

/// All endpoints of the wire contract.
pub static ENDPOINTS: [EndpointInfo; 13] = [
    EndpointInfo::new("login", HttpMethod::Post, "/auth/login", None),
    EndpointInfo::new("logout", HttpMethod::Post, "/auth/logout", None),
    EndpointInfo::new("verify_token", HttpMethod::Get, "/auth/verify", None),
    EndpointInfo::new("admin_stats", HttpMethod::Get, "/admin/stats", Some(Role::Admin)),
    EndpointInfo::new("admin_users", HttpMethod::Get, "/admin/users", Some(Role::Admin)),
    EndpointInfo::new(
        "update_user_status",
        HttpMethod::Patch,
        "/admin/users/{id}/status",
        Some(Role::Admin),
    ),
    EndpointInfo::new("issuer_diplomas", HttpMethod::Get, "/issuer/diplomas", Some(Role::Issuer)),
    EndpointInfo::new("create_diploma", HttpMethod::Post, "/issuer/diplomas", Some(Role::Issuer)),
    EndpointInfo::new(
        "diploma_status",
        HttpMethod::Get,
        "/issuer/diplomas/{id}/status",
        Some(Role::Issuer),
    ),
    EndpointInfo::new(
        "verify_diploma",
        HttpMethod::Get,
        "/verifier/verify/{hash}",
        Some(Role::Verifier),
    ),
    EndpointInfo::new(
        "verification_history",
        HttpMethod::Get,
        "/verifier/history",
        Some(Role::Verifier),
    ),
    EndpointInfo::new("blockchain_proof", HttpMethod::Get, "/blockchain/proof/{hash}", None),
    EndpointInfo::new(
        "transaction_status",
        HttpMethod::Get,
        "/blockchain/transaction/{txHash}",
        None,
    ),
];

/// A concrete endpoint with its path parameters bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Logout,
    VerifyToken,
    AdminStats,
    AdminUsers,
    UpdateUserStatus { user_id: String },
    IssuerDiplomas,
    CreateDiploma,
    DiplomaStatus { diploma_id: String },
    VerifyDiploma { hash: String },
    VerificationHistory,
    BlockchainProof { hash: String },
    TransactionStatus { tx_hash: String },
}

impl Endpoint {
    /// Registry entry for this endpoint.
    pub fn info(&self) -> &'static EndpointInfo {
        let index = match self {
            Endpoint::Login => 0,
            Endpoint::Logout => 1,
            Endpoint::VerifyToken => 2,
            Endpoint::AdminStats => 3,
            Endpoint::AdminUsers => 4,
            Endpoint::UpdateUserStatus { .. } => 5,
            Endpoint::IssuerDiplomas => 6,
            Endpoint::CreateDiploma => 7,
            Endpoint::DiplomaStatus { .. } => 8,
            Endpoint::VerifyDiploma { .. } => 9,
            Endpoint::VerificationHistory => 10,
            Endpoint::BlockchainProof { .. } => 11,
            Endpoint::TransactionStatus { .. } => 12,
        };
        &ENDPOINTS[index]
    }

    pub fn method(&self) -> HttpMethod {
        self.info().method
    }

    /// Unencoded path segments, parameters substituted.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::Login => vec!["auth", "login"],
            Endpoint::Logout => vec!["auth", "logout"],
            Endpoint::VerifyToken => vec!["auth", "verify"],
            Endpoint::AdminStats => vec!["admin", "stats"],
            Endpoint::AdminUsers => vec!["admin", "users"],
            Endpoint::UpdateUserStatus { user_id } => {
                vec!["admin", "users", user_id.as_str(), "status"]
            }
            Endpoint::IssuerDiplomas | Endpoint::CreateDiploma => vec!["issuer", "diplomas"],
            Endpoint::DiplomaStatus { diploma_id } => {
                vec!["issuer", "diplomas", diploma_id.as_str(), "status"]
            }
            Endpoint::VerifyDiploma { hash } => vec!["verifier", "verify", hash.as_str()],
            Endpoint::VerificationHistory => vec!["verifier", "history"],
            Endpoint::BlockchainProof { hash } => vec!["blockchain", "proof", hash.as_str()],
            Endpoint::TransactionStatus { tx_hash } => {
                vec!["blockchain", "transaction", tx_hash.as_str()]
            }
        }
    }

    /// Unencoded path, for logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Look up an endpoint by name.
pub fn get_endpoint_info(name: &str) -> Option<&'static EndpointInfo> {
    ENDPOINTS.iter().find(|e| e.name == name)
}

/// Endpoints a role is expected to call (role-specific plus shared ones).
pub fn endpoints_for_role(role: Role) -> Vec<&'static EndpointInfo> {
    ENDPOINTS
        .iter()
        .filter(|e| e.role.is_none() || e.role == Some(role))
        .collect()
}
