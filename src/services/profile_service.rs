//! Profile Service - lazy profile creation and nickname lookups

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::infrastructure::auth::ActorContext;
use crate::models::profile::{self, Entity as ProfileEntity};

pub const ANONYMOUS_NICKNAME: &str = "anonymous";

/// Make sure a profile row exists for the actor before a dependent write.
///
/// Existing rows are left untouched. Any failure is reported as
/// `DependencyFailed` so the caller aborts its main write.
pub async fn ensure_profile<C: ConnectionTrait>(
    conn: &C,
    actor: &ActorContext,
) -> Result<(), DomainError> {
    let now = chrono::Utc::now().to_rfc3339();
    let row = profile::ActiveModel {
        id: Set(actor.user_id.clone()),
        nickname: Set(actor.display_name()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    ProfileEntity::insert(row)
        .on_conflict(OnConflict::column(profile::Column::Id).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await
        .map_err(|e| {
            tracing::error!("Profile upsert failed for {}: {}", actor.user_id, e);
            DomainError::DependencyFailed("could not prepare user profile".to_string())
        })?;

    Ok(())
}

/// Nicknames for a set of user ids; unknown ids are simply absent
pub async fn nicknames<C: ConnectionTrait>(
    conn: &C,
    user_ids: impl IntoIterator<Item = String>,
) -> Result<HashMap<String, String>, DomainError> {
    let mut ids: Vec<String> = user_ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = ProfileEntity::find()
        .filter(profile::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(rows.into_iter().map(|p| (p.id, p.nickname)).collect())
}

pub fn nickname_or_placeholder(names: &HashMap<String, String>, user_id: &str) -> String {
    names
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| ANONYMOUS_NICKNAME.to_string())
}

/// The caller's own profile, created on first access
pub async fn get_own_profile(
    db: &DatabaseConnection,
    actor: &ActorContext,
) -> Result<profile::Model, DomainError> {
    ensure_profile(db, actor).await?;
    ProfileEntity::find_by_id(actor.user_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Profile"))
}

pub async fn update_nickname(
    db: &DatabaseConnection,
    actor: &ActorContext,
    nickname: &str,
) -> Result<profile::Model, DomainError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(DomainError::validation("Nickname must not be empty"));
    }
    if nickname.chars().count() > 30 {
        return Err(DomainError::validation("Nickname must be at most 30 characters"));
    }

    let current = get_own_profile(db, actor).await?;
    let mut active: profile::ActiveModel = current.into();
    active.nickname = Set(nickname.to_string());
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    Ok(active.update(db).await?)
}
