use axum::{Json, extract::State};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use crate::api::error::{ApiJson, ApiResult};
use crate::api::today;
use crate::infrastructure::auth::ActorContext;
use crate::services::{goal_service, ranking_service};

#[derive(Debug, serde::Deserialize)]
pub struct GoalRequest {
    pub target: i32,
}

#[utoipa::path(
    get,
    path = "/api/stats/genres",
    responses((status = 200, description = "Books finished this month per category"))
)]
pub async fn genre_trend(State(db): State<DatabaseConnection>) -> ApiResult<Json<Value>> {
    let genres = ranking_service::genre_trend(&db, today()).await?;
    Ok(Json(json!({ "genres": genres })))
}

#[utoipa::path(
    get,
    path = "/api/stats/reading-trend",
    responses(
        (status = 200, description = "Finished books per month over the last 12 months"),
        (status = 401, description = "Login required")
    )
)]
pub async fn reading_trend(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
) -> ApiResult<Json<Value>> {
    let trend = ranking_service::reading_trend(&db, &actor, today()).await?;
    Ok(Json(json!({ "trend": trend })))
}

#[utoipa::path(
    get,
    path = "/api/stats/activity-ranking",
    responses((status = 200, description = "Top readers of the current month"))
)]
pub async fn activity_ranking(State(db): State<DatabaseConnection>) -> ApiResult<Json<Value>> {
    let ranking = ranking_service::activity_ranking(&db, today()).await?;
    Ok(Json(json!({ "ranking": ranking })))
}

#[utoipa::path(
    get,
    path = "/api/goals/monthly",
    responses(
        (status = 200, description = "{ year, month, target, progress } for the current month"),
        (status = 401, description = "Login required")
    )
)]
pub async fn get_monthly_goal(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
) -> ApiResult<Json<goal_service::GoalProgress>> {
    Ok(Json(goal_service::current_goal(&db, &actor, today()).await?))
}

#[utoipa::path(
    post,
    path = "/api/goals/monthly",
    responses(
        (status = 200, description = "Goal saved"),
        (status = 400, description = "Target below 1")
    )
)]
pub async fn set_monthly_goal(
    State(db): State<DatabaseConnection>,
    actor: ActorContext,
    ApiJson(req): ApiJson<GoalRequest>,
) -> ApiResult<Json<goal_service::GoalProgress>> {
    Ok(Json(goal_service::set_goal(&db, &actor, req.target, today()).await?))
}
