//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: the HTTP backend gateway, session
//! storage and the static role directory.

mod http_client;
mod role_directory;
mod storage;

pub use http_client::{ApiClient, ApiResponse, WALLET_HEADER};
pub use role_directory::StaticRoleDirectory;
pub use storage::{FileStorage, MemoryStorage};
