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
use crate::services::review_service::{self, ReviewSort};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewParams {
    pub book_id: Option<i32>,
    pub review_id: Option<i32>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub book_id: Option<i32>,
    pub rating: i32,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub review_id: Option<i32>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub content: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("bookId" = i32, Query, description = "Book whose reviews to list"),
        ("sort" = Option<String>, Query, description = "recent (default) or popular")
    ),
    responses((status = 200, description = "Reviews with nickname and likedByMe"))
)]
pub async fn list_reviews(
    State(db): State<DatabaseConnection>,
    actor: Option<ActorContext>,
    ApiQuery(params): ApiQuery<ReviewParams>,
) -> ApiResult<Json<Value>> {
    let book_id = require_id(params.book_id, "bookId")?;
    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<ReviewSort>()?,
        None => ReviewSort::default(),
    };

    let reviews = review_service::list_reviews(&db, actor.as_ref(), book_id, sort).await?;
    Ok(Json(json!({ "reviews": reviews })))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    responses(
        (status = 201, description = "Review created"),
        (status = 400, description = "Rating outside 1..=5 or empty content"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn create_review(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let book_id = require_id(req.book_id, "bookId")?;
    let review =
        review_service::create_review(&db, &actor, book_id, req.rating, &req.content).await?;
    Ok((StatusCode::CREATED, Json(json!({ "review": review }))))
}

#[utoipa::path(
    patch,
    path = "/api/reviews",
    responses(
        (status = 200, description = "Review updated"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn update_review(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<UpdateReviewRequest>,
) -> ApiResult<Json<Value>> {
    let review_id = require_id(req.review_id, "reviewId")?;
    let review = review_service::update_review(
        &db,
        &actor,
        review_id,
        req.rating,
        req.content.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "review": review })))
}

#[utoipa::path(
    delete,
    path = "/api/reviews",
    params(("reviewId" = i32, Query, description = "Review to delete")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiQuery(params): ApiQuery<ReviewParams>,
) -> ApiResult<Json<Value>> {
    let review_id = require_id(params.review_id, "reviewId")?;
    review_service::delete_review(&db, &actor, review_id).await?;
    Ok(Json(json!({ "ok": true })))
}
