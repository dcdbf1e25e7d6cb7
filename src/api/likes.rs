use axum::{Json, extract::State};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::error::{ApiJson, ApiResult, require_id};
use crate::infrastructure::auth::ActorContext;
use crate::services::counter_service::{self, LikeToggle};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLikeRequest {
    #[serde(default)]
    pub review_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLikeRequest {
    #[serde(default)]
    pub quote_id: Option<i32>,
}

#[utoipa::path(
    post,
    path = "/api/review-likes",
    responses(
        (status = 200, description = "Toggled; returns { liked, likesCount }"),
        (status = 401, description = "Login required"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn toggle_review_like(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<ReviewLikeRequest>,
) -> ApiResult<Json<LikeToggle>> {
    let review_id = require_id(req.review_id, "reviewId")?;
    let toggle = counter_service::toggle_review_like(&db, &actor, review_id).await?;
    Ok(Json(toggle))
}

#[utoipa::path(
    post,
    path = "/api/quote-likes",
    responses(
        (status = 200, description = "Toggled; returns { liked, likesCount }"),
        (status = 401, description = "Login required"),
        (status = 404, description = "Quote not found")
    )
)]
pub async fn toggle_quote_like(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<QuoteLikeRequest>,
) -> ApiResult<Json<LikeToggle>> {
    let quote_id = require_id(req.quote_id, "quoteId")?;
    let toggle = counter_service::toggle_quote_like(&db, &actor, quote_id).await?;
    Ok(Json(toggle))
}
