//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use crate::models::book::Book;

/// Column values written to a `books` row by reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find a single book by ID
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError>;

    /// Find every book whose ISBN is in `isbns`
    async fn find_by_isbns(&self, isbns: &[String]) -> Result<Vec<Book>, DomainError>;

    /// Local keyword search over title and author
    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Book>, DomainError>;

    /// Apply `updates` by primary key, then upsert `inserts` keyed by ISBN.
    /// Both run inside one transaction.
    async fn apply_reconciliation(
        &self,
        updates: Vec<(i32, BookDraft)>,
        inserts: Vec<BookDraft>,
    ) -> Result<(), DomainError>;
}
