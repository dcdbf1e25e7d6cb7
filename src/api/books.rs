use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::{ApiPath, ApiQuery, ApiResult};
use crate::domain::{BookRepository, CatalogQuery, DomainError};
use crate::infrastructure::AppState;
use crate::models::Book;
use crate::services::catalog_service;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books/search",
    params(("q" = String, Query, description = "Keyword matched against title and author")),
    responses(
        (status = 200, description = "Catalog results with local ids attached"),
        (status = 400, description = "Empty query")
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<Value>> {
    let books = catalog_service::search(
        state.book_repo.as_ref(),
        state.catalog.as_ref(),
        params.q.as_deref().unwrap_or_default(),
        state.config.catalog_max_results,
    )
    .await?;

    Ok(Json(json!({ "books": books })))
}

#[utoipa::path(
    get,
    path = "/api/books/bestsellers",
    responses(
        (status = 200, description = "Current bestseller list"),
        (status = 502, description = "Catalog unavailable")
    )
)]
pub async fn bestsellers(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    curated(state, CatalogQuery::Bestseller).await
}

#[utoipa::path(
    get,
    path = "/api/books/new",
    responses(
        (status = 200, description = "New arrivals"),
        (status = 502, description = "Catalog unavailable")
    )
)]
pub async fn new_arrivals(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    curated(state, CatalogQuery::NewArrivals).await
}

async fn curated(state: AppState, query: CatalogQuery) -> ApiResult<Json<Value>> {
    let books = catalog_service::curated_list(
        state.book_repo.as_ref(),
        state.catalog.as_ref(),
        query,
        state.config.catalog_max_results,
    )
    .await?;

    Ok(Json(json!({ "books": books })))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Local book id")),
    responses(
        (status = 200, description = "Book details"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Json<Book>> {
    let book = state
        .book_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    Ok(Json(book))
}
