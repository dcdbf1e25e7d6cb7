//! Review Service - book reviews with cached like counts

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::str::FromStr;

use crate::domain::DomainError;
use crate::infrastructure::auth::{ActorContext, load_owned};
use crate::models::{book, review, review_like};
use crate::services::counter_service::reviews_liked_by;
use crate::services::profile_service::{ensure_profile, nickname_or_placeholder, nicknames};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewSort {
    #[default]
    Recent,
    Popular,
}

impl FromStr for ReviewSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recent" => Ok(ReviewSort::Recent),
            "popular" => Ok(ReviewSort::Popular),
            other => Err(DomainError::validation(format!(
                "Unknown sort '{}', expected recent or popular",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: review::Model,
    pub nickname: String,
    pub liked_by_me: bool,
}

fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::validation("Rating must be between 1 and 5"));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("Review content must not be empty"));
    }
    Ok(content.to_string())
}

pub async fn list_reviews(
    db: &DatabaseConnection,
    actor: Option<&ActorContext>,
    book_id: i32,
    sort: ReviewSort,
) -> Result<Vec<ReviewView>, DomainError> {
    let mut query = review::Entity::find().filter(review::Column::BookId.eq(book_id));
    query = match sort {
        ReviewSort::Recent => query
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id),
        ReviewSort::Popular => query
            .order_by_desc(review::Column::LikesCount)
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id),
    };
    let reviews = query.all(db).await?;

    let ids: Vec<i32> = reviews.iter().map(|r| r.id).collect();
    let liked = match actor {
        Some(actor) => reviews_liked_by(db, actor, &ids).await?,
        None => Default::default(),
    };
    let names = nicknames(db, reviews.iter().map(|r| r.user_id.clone())).await?;

    Ok(reviews
        .into_iter()
        .map(|review| ReviewView {
            nickname: nickname_or_placeholder(&names, &review.user_id),
            liked_by_me: liked.contains(&review.id),
            review,
        })
        .collect())
}

pub async fn create_review(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
    rating: i32,
    content: &str,
) -> Result<review::Model, DomainError> {
    validate_rating(rating)?;
    let content = validate_content(content)?;

    book::Entity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    let txn = db.begin().await?;
    ensure_profile(&txn, actor).await?;

    let row = review::ActiveModel {
        book_id: Set(book_id),
        user_id: Set(actor.user_id.clone()),
        content: Set(content),
        rating: Set(rating),
        likes_count: Set(0),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        updated_at: Set(None),
        ..Default::default()
    };
    let created = row.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!("Review {} created on book {}", created.id, book_id);
    Ok(created)
}

pub async fn update_review(
    db: &DatabaseConnection,
    actor: &ActorContext,
    review_id: i32,
    rating: Option<i32>,
    content: Option<&str>,
) -> Result<review::Model, DomainError> {
    if rating.is_none() && content.is_none() {
        return Err(DomainError::validation("Nothing to update: provide rating or content"));
    }
    if let Some(rating) = rating {
        validate_rating(rating)?;
    }
    let content = content.map(validate_content).transpose()?;

    let current = load_owned::<review::Entity, _>(db, actor, review_id, "Review").await?;

    let mut active: review::ActiveModel = current.into();
    if let Some(rating) = rating {
        active.rating = Set(rating);
    }
    if let Some(content) = content {
        active.content = Set(content);
    }
    active.updated_at = Set(Some(chrono::Utc::now().to_rfc3339()));

    Ok(active.update(db).await?)
}

pub async fn delete_review(
    db: &DatabaseConnection,
    actor: &ActorContext,
    review_id: i32,
) -> Result<(), DomainError> {
    load_owned::<review::Entity, _>(db, actor, review_id, "Review").await?;

    let txn = db.begin().await?;
    review_like::Entity::delete_many()
        .filter(review_like::Column::ReviewId.eq(review_id))
        .exec(&txn)
        .await?;
    review::Entity::delete_by_id(review_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Review {} deleted by {}", review_id, actor.user_id);
    Ok(())
}
