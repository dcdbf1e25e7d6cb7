use axum::{Json, extract::State};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::error::{ApiJson, ApiResult};
use crate::infrastructure::auth::ActorContext;
use crate::models::profile;
use crate::services::profile_service;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: String,
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Caller's profile, created on first access"),
        (status = 401, description = "Login required")
    )
)]
pub async fn get_profile(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
) -> ApiResult<Json<profile::Model>> {
    Ok(Json(profile_service::get_own_profile(&db, &actor).await?))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    responses(
        (status = 200, description = "Nickname updated"),
        (status = 400, description = "Empty or overlong nickname")
    )
)]
pub async fn update_profile(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<profile::Model>> {
    Ok(Json(
        profile_service::update_nickname(&db, &actor, &req.nickname).await?,
    ))
}
