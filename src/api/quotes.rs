use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::{ApiJson, ApiQuery, ApiResult, require_id};
use crate::infrastructure::auth::ActorContext;
use crate::services::quote_service;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub book_id: Option<i32>,
    pub quote_id: Option<i32>,
    pub comment_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    #[serde(default)]
    pub book_id: Option<i32>,
    pub content: String,
    #[serde(default)]
    pub page: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub quote_id: Option<i32>,
    pub content: String,
}

#[utoipa::path(
    get,
    path = "/api/quotes",
    params(("bookId" = i32, Query, description = "Book whose quotes to list")),
    responses((status = 200, description = "Quotes with like/comment counts and likedByMe"))
)]
pub async fn list_quotes(
    State(db): State<DatabaseConnection>,
    actor: Option<ActorContext>,
    ApiQuery(params): ApiQuery<QuoteParams>,
) -> ApiResult<Json<Value>> {
    let book_id = require_id(params.book_id, "bookId")?;
    let quotes = quote_service::list_quotes(&db, actor.as_ref(), book_id).await?;
    Ok(Json(json!({ "quotes": quotes })))
}

#[utoipa::path(
    post,
    path = "/api/quotes",
    responses(
        (status = 201, description = "Quote created"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_quote(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<CreateQuoteRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let book_id = require_id(req.book_id, "bookId")?;
    let quote = quote_service::create_quote(&db, &actor, book_id, &req.content, req.page).await?;
    Ok((StatusCode::CREATED, Json(json!({ "quote": quote }))))
}

#[utoipa::path(
    delete,
    path = "/api/quotes",
    params(("quoteId" = i32, Query, description = "Quote to delete")),
    responses(
        (status = 200, description = "Quote deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Quote not found")
    )
)]
pub async fn delete_quote(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiQuery(params): ApiQuery<QuoteParams>,
) -> ApiResult<Json<Value>> {
    let quote_id = require_id(params.quote_id, "quoteId")?;
    quote_service::delete_quote(&db, &actor, quote_id).await?;
    Ok(Json(json!({ "ok": true })))
}

#[utoipa::path(
    get,
    path = "/api/quote-comments",
    params(("quoteId" = i32, Query, description = "Quote whose comments to list")),
    responses((status = 200, description = "Comments, oldest first"))
)]
pub async fn list_comments(
    State(db): State<DatabaseConnection>,
    ApiQuery(params): ApiQuery<QuoteParams>,
) -> ApiResult<Json<Value>> {
    let quote_id = require_id(params.quote_id, "quoteId")?;
    let comments = quote_service::list_comments(&db, quote_id).await?;
    Ok(Json(json!({ "comments": comments })))
}

#[utoipa::path(
    post,
    path = "/api/quote-comments",
    responses(
        (status = 201, description = "Comment created"),
        (status = 404, description = "Quote not found")
    )
)]
pub async fn create_comment(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let quote_id = require_id(req.quote_id, "quoteId")?;
    let comment = quote_service::create_comment(&db, &actor, quote_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": comment }))))
}

#[utoipa::path(
    delete,
    path = "/api/quote-comments",
    params(("commentId" = i32, Query, description = "Comment to delete")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Comment not found")
    )
)]
pub async fn delete_comment(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiQuery(params): ApiQuery<QuoteParams>,
) -> ApiResult<Json<Value>> {
    let comment_id = require_id(params.comment_id, "commentId")?;
    quote_service::delete_comment(&db, &actor, comment_id).await?;
    Ok(Json(json!({ "ok": true })))
}
