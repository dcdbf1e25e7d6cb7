//! External catalog contract
//!
//! The gateway turns one upstream call into a list of [`NormalizedBook`]s.
//! Implementations live in `modules::integrations`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DomainError;

/// What to ask the external catalog for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    Keyword(String),
    Bestseller,
    NewArrivals,
}

/// A catalog item mapped into the local shape, before it has a local id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBook {
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub cover: Option<String>,
    pub description: Option<String>,
    pub rank: Option<u32>,
    pub pub_date: Option<String>,
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Issue one upstream call and normalize every returned item.
    ///
    /// Fails with [`DomainError::Upstream`] when the catalog is unreachable or
    /// answers with an error, and [`DomainError::Configuration`] when no API
    /// key is configured.
    async fn fetch(
        &self,
        query: &CatalogQuery,
        max_results: u32,
    ) -> Result<Vec<NormalizedBook>, DomainError>;
}
