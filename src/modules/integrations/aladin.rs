//! Aladin TTB open API client
//!
//! Keyword searches hit `ItemSearch.aspx`, curated lists hit `ItemList.aspx`.
//! Every request pins the API version and asks for large covers.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{CatalogGateway, CatalogQuery, DomainError, NormalizedBook};
use crate::infrastructure::config::Config;

const API_VERSION: &str = "20131101";
const COVER_SIZE: &str = "Big";
const USER_AGENT: &str = "readmate/0.3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AladinResponse {
    #[serde(default)]
    item: Vec<AladinItem>,
    error_code: Option<i64>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AladinItem {
    title: String,
    author: Option<String>,
    publisher: Option<String>,
    category_name: Option<String>,
    isbn: Option<String>,
    isbn13: Option<String>,
    cover: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    best_rank: Option<u32>,
}

pub struct AladinClient {
    client: Result<reqwest::Client, String>,
    base_url: String,
    ttb_key: Option<String>,
}

impl AladinClient {
    pub fn new(base_url: impl Into<String>, ttb_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to create Aladin HTTP client: {}", e);
                format!("Failed to create HTTP client: {}", e)
            });

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ttb_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.aladin_base_url.clone(), config.aladin_ttb_key.clone())
    }

    fn request_for(
        &self,
        query: &CatalogQuery,
        key: &str,
        max_results: u32,
    ) -> Result<reqwest::RequestBuilder, DomainError> {
        let client = self.client.as_ref().map_err(|e| DomainError::Upstream(e.clone()))?;

        let mut params: Vec<(&str, String)> = vec![
            ("ttbkey", key.to_string()),
            ("MaxResults", max_results.to_string()),
            ("start", "1".to_string()),
            ("SearchTarget", "Book".to_string()),
            ("output", "js".to_string()),
            ("Version", API_VERSION.to_string()),
            ("Cover", COVER_SIZE.to_string()),
        ];

        let endpoint = match query {
            CatalogQuery::Keyword(q) => {
                params.push(("Query", q.clone()));
                params.push(("QueryType", "Keyword".to_string()));
                "ItemSearch.aspx"
            }
            CatalogQuery::Bestseller => {
                params.push(("QueryType", "Bestseller".to_string()));
                "ItemList.aspx"
            }
            CatalogQuery::NewArrivals => {
                params.push(("QueryType", "ItemNewAll".to_string()));
                "ItemList.aspx"
            }
        };

        Ok(client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&params))
    }
}

#[async_trait]
impl CatalogGateway for AladinClient {
    async fn fetch(
        &self,
        query: &CatalogQuery,
        max_results: u32,
    ) -> Result<Vec<NormalizedBook>, DomainError> {
        let key = self
            .ttb_key
            .as_deref()
            .ok_or_else(|| DomainError::Configuration("ALADIN_TTB_KEY is not set".into()))?;

        let resp = self
            .request_for(query, key, max_results)?
            .send()
            .await
            .map_err(|e| DomainError::Upstream(format!("Failed to send request: {}", e)))?;

        if !resp.status().is_success() {
            return Err(DomainError::Upstream(format!(
                "Aladin API returned status: {}",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DomainError::Upstream(format!("Failed to read response body: {}", e)))?;

        let items = parse_response(&body)?;
        let ranked = matches!(query, CatalogQuery::Bestseller);

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(position, item)| normalize_item(item, ranked.then_some(position as u32 + 1)))
            .collect())
    }
}

fn parse_response(body: &str) -> Result<Vec<AladinItem>, DomainError> {
    // The js output format is occasionally terminated with a semicolon
    let trimmed = body.trim().trim_end_matches(';');

    let parsed: AladinResponse = serde_json::from_str(trimmed)
        .map_err(|e| DomainError::Upstream(format!("Failed to parse JSON: {}", e)))?;

    if let Some(code) = parsed.error_code {
        return Err(DomainError::Upstream(format!(
            "Aladin API error {}: {}",
            code,
            parsed.error_message.unwrap_or_default()
        )));
    }

    Ok(parsed.item)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `국내도서>소설/시/희곡>독일소설` → `소설/시/희곡`
fn category_of(path: Option<String>) -> Option<String> {
    let path = non_blank(path)?;
    let segment = path.split('>').nth(1).unwrap_or(&path).trim();
    (!segment.is_empty()).then(|| segment.to_string())
}

fn normalize_item(item: AladinItem, list_position: Option<u32>) -> NormalizedBook {
    NormalizedBook {
        title: item.title.trim().to_string(),
        author: non_blank(item.author),
        publisher: non_blank(item.publisher),
        category: category_of(item.category_name),
        isbn: non_blank(item.isbn13).or_else(|| non_blank(item.isbn)),
        cover: non_blank(item.cover),
        description: non_blank(item.description),
        rank: item.best_rank.or(list_position),
        pub_date: non_blank(item.pub_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn13_preferred_and_fallback() {
        let body = r#"{"item":[
            {"title":"데미안","isbn":"8937460440","isbn13":"9788937460449","categoryName":"국내도서>소설/시/희곡>독일소설"},
            {"title":"Old Edition","isbn":"1234567890","isbn13":""},
            {"title":"No Isbn"}
        ]};"#;

        let items: Vec<NormalizedBook> = parse_response(body)
            .unwrap()
            .into_iter()
            .map(|i| normalize_item(i, None))
            .collect();

        assert_eq!(items[0].isbn.as_deref(), Some("9788937460449"));
        assert_eq!(items[0].category.as_deref(), Some("소설/시/희곡"));
        assert_eq!(items[1].isbn.as_deref(), Some("1234567890"));
        assert_eq!(items[2].isbn, None);
        assert_eq!(items[2].category, None);
    }

    #[tokio::test]
    async fn test_client_build_failure_surfaces_as_upstream() {
        let gateway = AladinClient {
            client: Err("Failed to create HTTP client: tls backend".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            ttb_key: Some("key".to_string()),
        };

        let result = gateway.fetch(&CatalogQuery::Bestseller, 10).await;
        assert!(matches!(result, Err(DomainError::Upstream(msg)) if msg.contains("HTTP client")));
    }

    #[test]
    fn test_error_payload_is_upstream_failure() {
        let body = r#"{"errorCode":10,"errorMessage":"잘못된 TTBKey 입니다."}"#;
        assert!(matches!(parse_response(body), Err(DomainError::Upstream(_))));
    }

    #[test]
    fn test_category_without_path_kept_whole() {
        assert_eq!(category_of(Some("에세이".into())).as_deref(), Some("에세이"));
        assert_eq!(category_of(Some("  ".into())), None);
    }

    #[test]
    fn test_rank_prefers_best_rank() {
        let item = AladinItem {
            title: "T".into(),
            author: None,
            publisher: None,
            category_name: None,
            isbn: None,
            isbn13: None,
            cover: None,
            description: None,
            pub_date: None,
            best_rank: Some(3),
        };
        assert_eq!(normalize_item(item, Some(1)).rank, Some(3));
    }
}
