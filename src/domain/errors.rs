//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The HTTP layer maps them onto status codes in `api::error`.

use std::fmt;

#[derive(Debug)]
pub enum DomainError {
    /// No identity could be resolved for the caller
    Unauthenticated,
    /// Caller is authenticated but does not own the target resource
    Forbidden,
    /// Missing or malformed input, with a user-facing message
    Validation(String),
    /// Target resource does not exist
    NotFound(String),
    /// External catalog call failed
    Upstream(String),
    /// A prerequisite write (e.g. the profile upsert) failed
    DependencyFailed(String),
    /// Database/persistence error
    Database(String),
    /// Server is missing required configuration
    Configuration(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::Unauthenticated => write!(f, "Authentication required"),
            DomainError::Forbidden => write!(f, "You do not have permission to modify this resource"),
            DomainError::Validation(msg) => write!(f, "Validation error: {}", msg),
            DomainError::NotFound(what) => write!(f, "{} not found", what),
            DomainError::Upstream(msg) => write!(f, "External service error: {}", msg),
            DomainError::DependencyFailed(msg) => write!(f, "Dependency failed: {}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}
