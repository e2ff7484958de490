//! # Domain Module
//!
//! Core types of the diploma client: session entities, wire records,
//! the endpoint registry and error types.

pub mod endpoints;
pub mod entities;
pub mod errors;
pub mod invariants;
pub mod records;

pub use endpoints::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use records::*;
