//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM queries, no Axum).
//! Only trait definitions, shared value types and domain error types.

pub mod catalog;
pub mod errors;
pub mod repositories;

pub use catalog::*;
pub use errors::DomainError;
pub use repositories::*;
