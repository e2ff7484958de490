//! # Diploma Client
//!
//! Wallet-backed session, role routing and verification flows for the
//! diploma verification platform.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Hold one session (identity, role, connection state) shared by every view
//! - Resolve the role of a connected identity and route it to its dashboard
//! - Talk to the diploma backend, sending the acting identity on every call
//! - Drive the verifier, issuer and administrator workflows
//!
//! ## Session Lifecycle
//!
//! ```text
//!                connect()                    signer ok
//!  Disconnected ───────────► Connecting ──────────────────► Connected
//!       ▲                        │                             │
//!       │   signer failure       │                             │
//!       │   (previous session)   │                             │
//!       └────────────────────────┘◄──── disconnect() ──────────┘
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! diploma-client/
//! ├── domain/          # Identity, Role, Session, wire records, endpoints, errors
//! ├── ports/           # SessionControl (inbound) + Signer, SessionStorage,
//! │                    # RoleResolver, DiplomaApi (outbound)
//! ├── adapters/        # reqwest gateway, file/memory storage, role directory
//! ├── application/     # SessionStore, router, flows, DiplomaClient
//! └── config.rs        # ClientConfig
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{ApiClient, ApiResponse, FileStorage, MemoryStorage, StaticRoleDirectory};
pub use application::{
    select_view, AdminOverview, ClientError, DashboardSelector, DashboardView, Debouncer,
    DiplomaClient, DiplomaCreationFlow, HistoryFilter, HistoryView, ProofStatus, SessionStore,
    VerificationFlow, VerificationOutcome,
};
pub use config::{ClientConfig, ConfigError};
pub use domain::{
    ApiError, ConnectError, ConnectionState, DiplomaDraft, DiplomaRecord, Endpoint, FlowError,
    Identity, Role, Session, SessionSnapshot,
};
pub use ports::{DiplomaApi, RoleResolver, SessionControl, SessionStorage, Signer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
