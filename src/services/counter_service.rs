//! Counter aggregation over like/comment tables
//!
//! Counts are always derived from the event rows. The only cached copy is
//! `reviews.likes_count`, rewritten after every review-like toggle.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::DomainError;
use crate::infrastructure::auth::ActorContext;
use crate::models::{quote, quote_comment, quote_like, review, review_like};
use crate::services::profile_service::ensure_profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: u64,
}

/// `parent id → number of rows` for the given parents. Parents without rows
/// are absent from the map.
async fn count_grouped<E, C>(
    conn: &C,
    parent: E::Column,
    ids: &[i32],
) -> Result<HashMap<i32, u64>, DomainError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = E::find()
        .select_only()
        .column(parent)
        .column_as(Expr::col(parent).count(), "count")
        .filter(parent.is_in(ids.iter().copied()))
        .group_by(parent)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

/// Parents among `ids` that `user_id` has a row for
async fn ids_marked_by<E, C>(
    conn: &C,
    parent: E::Column,
    user: E::Column,
    user_id: &str,
    ids: &[i32],
) -> Result<HashSet<i32>, DomainError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<i32> = E::find()
        .select_only()
        .column(parent)
        .filter(user.eq(user_id))
        .filter(parent.is_in(ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows.into_iter().collect())
}

pub async fn review_like_counts<C: ConnectionTrait>(
    conn: &C,
    review_ids: &[i32],
) -> Result<HashMap<i32, u64>, DomainError> {
    count_grouped::<review_like::Entity, _>(conn, review_like::Column::ReviewId, review_ids).await
}

pub async fn quote_like_counts<C: ConnectionTrait>(
    conn: &C,
    quote_ids: &[i32],
) -> Result<HashMap<i32, u64>, DomainError> {
    count_grouped::<quote_like::Entity, _>(conn, quote_like::Column::QuoteId, quote_ids).await
}

pub async fn quote_comment_counts<C: ConnectionTrait>(
    conn: &C,
    quote_ids: &[i32],
) -> Result<HashMap<i32, u64>, DomainError> {
    count_grouped::<quote_comment::Entity, _>(conn, quote_comment::Column::QuoteId, quote_ids)
        .await
}

pub async fn reviews_liked_by<C: ConnectionTrait>(
    conn: &C,
    actor: &ActorContext,
    review_ids: &[i32],
) -> Result<HashSet<i32>, DomainError> {
    ids_marked_by::<review_like::Entity, _>(
        conn,
        review_like::Column::ReviewId,
        review_like::Column::UserId,
        &actor.user_id,
        review_ids,
    )
    .await
}

pub async fn quotes_liked_by<C: ConnectionTrait>(
    conn: &C,
    actor: &ActorContext,
    quote_ids: &[i32],
) -> Result<HashSet<i32>, DomainError> {
    ids_marked_by::<quote_like::Entity, _>(
        conn,
        quote_like::Column::QuoteId,
        quote_like::Column::UserId,
        &actor.user_id,
        quote_ids,
    )
    .await
}

fn require_target(id: i32, what: &str) -> Result<(), DomainError> {
    if id <= 0 {
        return Err(DomainError::validation(format!("A valid {} id is required", what)));
    }
    Ok(())
}

/// Like the review if the actor has not yet, unlike it otherwise, then
/// recount and cache the count on the review row.
pub async fn toggle_review_like(
    db: &DatabaseConnection,
    actor: &ActorContext,
    review_id: i32,
) -> Result<LikeToggle, DomainError> {
    require_target(review_id, "review")?;
    review::Entity::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Review"))?;

    let txn = db.begin().await?;
    ensure_profile(&txn, actor).await?;

    let existing = review_like::Entity::find()
        .filter(review_like::Column::ReviewId.eq(review_id))
        .filter(review_like::Column::UserId.eq(actor.user_id.as_str()))
        .one(&txn)
        .await?;

    let liked = match existing {
        Some(row) => {
            review_like::Entity::delete_by_id(row.id).exec(&txn).await?;
            false
        }
        None => {
            let row = review_like::ActiveModel {
                review_id: Set(review_id),
                user_id: Set(actor.user_id.clone()),
                created_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            };
            review_like::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([review_like::Column::ReviewId, review_like::Column::UserId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            true
        }
    };

    let likes_count = review_like::Entity::find()
        .filter(review_like::Column::ReviewId.eq(review_id))
        .count(&txn)
        .await?;
    txn.commit().await?;

    // The toggle already happened; a stale cache is repaired by the next toggle
    if let Err(e) = review::Entity::update_many()
        .col_expr(review::Column::LikesCount, Expr::value(likes_count as i32))
        .filter(review::Column::Id.eq(review_id))
        .exec(db)
        .await
    {
        tracing::warn!("Failed to cache likes_count on review {}: {}", review_id, e);
    }

    Ok(LikeToggle { liked, likes_count })
}

/// Like/unlike a quote. Quote like counts are never cached.
pub async fn toggle_quote_like(
    db: &DatabaseConnection,
    actor: &ActorContext,
    quote_id: i32,
) -> Result<LikeToggle, DomainError> {
    require_target(quote_id, "quote")?;
    quote::Entity::find_by_id(quote_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Quote"))?;

    let txn = db.begin().await?;
    ensure_profile(&txn, actor).await?;

    let existing = quote_like::Entity::find()
        .filter(quote_like::Column::QuoteId.eq(quote_id))
        .filter(quote_like::Column::UserId.eq(actor.user_id.as_str()))
        .one(&txn)
        .await?;

    let liked = match existing {
        Some(row) => {
            quote_like::Entity::delete_by_id(row.id).exec(&txn).await?;
            false
        }
        None => {
            let row = quote_like::ActiveModel {
                quote_id: Set(quote_id),
                user_id: Set(actor.user_id.clone()),
                created_at: Set(chrono::Utc::now().to_rfc3339()),
                ..Default::default()
            };
            quote_like::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([quote_like::Column::QuoteId, quote_like::Column::UserId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
            true
        }
    };

    let likes_count = quote_like::Entity::find()
        .filter(quote_like::Column::QuoteId.eq(quote_id))
        .count(&txn)
        .await?;
    txn.commit().await?;

    Ok(LikeToggle { liked, likes_count })
}
