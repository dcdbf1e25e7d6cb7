//! Goal Service - monthly reading targets

use chrono::{Datelike, NaiveDate};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use crate::domain::DomainError;
use crate::infrastructure::auth::ActorContext;
use crate::models::monthly_goal;
use crate::services::ranking_service::finished_this_month;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub year: i32,
    pub month: u32,
    /// `None` when no goal was set for the month
    pub target: Option<i32>,
    pub progress: u64,
}

async fn find_goal(
    db: &DatabaseConnection,
    actor: &ActorContext,
    year: i32,
    month: u32,
) -> Result<Option<monthly_goal::Model>, DomainError> {
    Ok(monthly_goal::Entity::find()
        .filter(monthly_goal::Column::UserId.eq(actor.user_id.as_str()))
        .filter(monthly_goal::Column::Year.eq(year))
        .filter(monthly_goal::Column::Month.eq(month as i32))
        .one(db)
        .await?)
}

/// The caller's goal for the month containing `today` with books finished so far
pub async fn current_goal(
    db: &DatabaseConnection,
    actor: &ActorContext,
    today: NaiveDate,
) -> Result<GoalProgress, DomainError> {
    let (year, month) = (today.year(), today.month());
    let goal = find_goal(db, actor, year, month).await?;
    let progress = finished_this_month(db, &actor.user_id, today).await?;

    Ok(GoalProgress {
        year,
        month,
        target: goal.map(|g| g.target),
        progress,
    })
}

/// Create or replace the caller's target for the current month
pub async fn set_goal(
    db: &DatabaseConnection,
    actor: &ActorContext,
    target: i32,
    today: NaiveDate,
) -> Result<GoalProgress, DomainError> {
    if target < 1 {
        return Err(DomainError::validation("Target must be at least 1"));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let row = monthly_goal::ActiveModel {
        user_id: Set(actor.user_id.clone()),
        year: Set(today.year()),
        month: Set(today.month() as i32),
        target: Set(target),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    monthly_goal::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                monthly_goal::Column::UserId,
                monthly_goal::Column::Year,
                monthly_goal::Column::Month,
            ])
            .update_columns([monthly_goal::Column::Target, monthly_goal::Column::UpdatedAt])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    tracing::debug!(
        "Goal for {} set to {} ({}-{:02})",
        actor.user_id,
        target,
        today.year(),
        today.month()
    );
    current_goal(db, actor, today).await
}
