use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::error::{ApiJson, ApiQuery, ApiResult, require_id};
use crate::api::today;
use crate::infrastructure::auth::ActorContext;
use crate::services::library_service::{self, parse_status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryParams {
    pub status: Option<String>,
    pub book_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    #[serde(default)]
    pub book_id: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub emotion_tag: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/user-books",
    params(
        ("status" = Option<String>, Query, description = "want, reading or finished"),
        ("bookId" = Option<i32>, Query, description = "Return only the entry for this book")
    ),
    responses(
        (status = 200, description = "Caller's library entries"),
        (status = 401, description = "Login required")
    )
)]
pub async fn list_user_books(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiQuery(params): ApiQuery<LibraryParams>,
) -> ApiResult<Json<Value>> {
    if let Some(book_id) = params.book_id {
        let entry = library_service::get_entry(&db, &actor, book_id).await?;
        return Ok(Json(json!({ "entry": entry })));
    }

    let status = params.status.as_deref().map(parse_status).transpose()?;
    let entries = library_service::list_entries(&db, &actor, status).await?;
    Ok(Json(json!({ "entries": entries })))
}

#[utoipa::path(
    post,
    path = "/api/user-books",
    responses(
        (status = 201, description = "Book added to the library"),
        (status = 200, description = "Book was already in the library"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_user_book(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<EntryRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let book_id = require_id(req.book_id, "bookId")?;
    let status = req.status.as_deref().map(parse_status).transpose()?;

    let (entry, created) = library_service::add_entry(
        &db,
        &actor,
        book_id,
        status,
        req.emotion_tag.as_deref(),
        today(),
    )
    .await?;

    let code = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((code, Json(json!({ "entry": entry }))))
}

#[utoipa::path(
    patch,
    path = "/api/user-books",
    responses(
        (status = 200, description = "Entry updated"),
        (status = 404, description = "Book is not in the library")
    )
)]
pub async fn update_user_book(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<EntryRequest>,
) -> ApiResult<Json<Value>> {
    let book_id = require_id(req.book_id, "bookId")?;
    let status = req.status.as_deref().map(parse_status).transpose()?;

    let entry = library_service::update_entry(
        &db,
        &actor,
        book_id,
        status,
        req.emotion_tag.as_deref(),
        today(),
    )
    .await?;

    Ok(Json(json!({ "entry": entry })))
}

#[utoipa::path(
    delete,
    path = "/api/user-books",
    params(("bookId" = i32, Query, description = "Book to remove from the library")),
    responses(
        (status = 200, description = "Entry removed"),
        (status = 404, description = "Book is not in the library")
    )
)]
pub async fn remove_user_book(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiQuery(params): ApiQuery<LibraryParams>,
) -> ApiResult<Json<Value>> {
    let book_id = require_id(params.book_id, "bookId")?;
    library_service::remove_entry(&db, &actor, book_id).await?;
    Ok(Json(json!({ "ok": true })))
}
