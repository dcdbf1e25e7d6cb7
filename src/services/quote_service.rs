//! Quote Service - quotes from books and the comment threads under them

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::domain::DomainError;
use crate::infrastructure::auth::{ActorContext, load_owned};
use crate::models::{book, quote, quote_comment, quote_like};
use crate::services::counter_service::{quote_comment_counts, quote_like_counts, quotes_liked_by};
use crate::services::profile_service::{ensure_profile, nickname_or_placeholder, nicknames};

const MAX_QUOTE_CHARS: usize = 1000;
const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: quote::Model,
    pub nickname: String,
    pub likes_count: u64,
    pub comments_count: u64,
    pub liked_by_me: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: quote_comment::Model,
    pub nickname: String,
}

fn validate_text(text: &str, what: &str, max: usize) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::validation(format!("{} must not be empty", what)));
    }
    if text.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            what, max
        )));
    }
    Ok(text.to_string())
}

pub async fn list_quotes(
    db: &DatabaseConnection,
    actor: Option<&ActorContext>,
    book_id: i32,
) -> Result<Vec<QuoteView>, DomainError> {
    let quotes = quote::Entity::find()
        .filter(quote::Column::BookId.eq(book_id))
        .order_by_desc(quote::Column::CreatedAt)
        .order_by_desc(quote::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i32> = quotes.iter().map(|q| q.id).collect();
    let likes = quote_like_counts(db, &ids).await?;
    let comments = quote_comment_counts(db, &ids).await?;
    let liked = match actor {
        Some(actor) => quotes_liked_by(db, actor, &ids).await?,
        None => Default::default(),
    };
    let names = nicknames(db, quotes.iter().map(|q| q.user_id.clone())).await?;

    Ok(quotes
        .into_iter()
        .map(|quote| QuoteView {
            nickname: nickname_or_placeholder(&names, &quote.user_id),
            likes_count: likes.get(&quote.id).copied().unwrap_or(0),
            comments_count: comments.get(&quote.id).copied().unwrap_or(0),
            liked_by_me: liked.contains(&quote.id),
            quote,
        })
        .collect())
}

pub async fn create_quote(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
    content: &str,
    page: Option<i32>,
) -> Result<quote::Model, DomainError> {
    let content = validate_text(content, "Quote", MAX_QUOTE_CHARS)?;
    if page.is_some_and(|p| p < 1) {
        return Err(DomainError::validation("Page must be a positive number"));
    }

    book::Entity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    let txn = db.begin().await?;
    ensure_profile(&txn, actor).await?;

    let created = quote::ActiveModel {
        book_id: Set(book_id),
        user_id: Set(actor.user_id.clone()),
        content: Set(content),
        page: Set(page),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!("Quote {} created on book {}", created.id, book_id);
    Ok(created)
}

pub async fn delete_quote(
    db: &DatabaseConnection,
    actor: &ActorContext,
    quote_id: i32,
) -> Result<(), DomainError> {
    load_owned::<quote::Entity, _>(db, actor, quote_id, "Quote").await?;

    let txn = db.begin().await?;
    quote_like::Entity::delete_many()
        .filter(quote_like::Column::QuoteId.eq(quote_id))
        .exec(&txn)
        .await?;
    quote_comment::Entity::delete_many()
        .filter(quote_comment::Column::QuoteId.eq(quote_id))
        .exec(&txn)
        .await?;
    quote::Entity::delete_by_id(quote_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Quote {} deleted by {}", quote_id, actor.user_id);
    Ok(())
}

/// Comments on a quote, oldest first
pub async fn list_comments(
    db: &DatabaseConnection,
    quote_id: i32,
) -> Result<Vec<CommentView>, DomainError> {
    let comments = quote_comment::Entity::find()
        .filter(quote_comment::Column::QuoteId.eq(quote_id))
        .order_by_asc(quote_comment::Column::CreatedAt)
        .order_by_asc(quote_comment::Column::Id)
        .all(db)
        .await?;

    let names = nicknames(db, comments.iter().map(|c| c.user_id.clone())).await?;

    Ok(comments
        .into_iter()
        .map(|comment| CommentView {
            nickname: nickname_or_placeholder(&names, &comment.user_id),
            comment,
        })
        .collect())
}

pub async fn create_comment(
    db: &DatabaseConnection,
    actor: &ActorContext,
    quote_id: i32,
    content: &str,
) -> Result<CommentView, DomainError> {
    let content = validate_text(content, "Comment", MAX_COMMENT_CHARS)?;

    quote::Entity::find_by_id(quote_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Quote"))?;

    let txn = db.begin().await?;
    ensure_profile(&txn, actor).await?;

    let comment = quote_comment::ActiveModel {
        quote_id: Set(quote_id),
        user_id: Set(actor.user_id.clone()),
        content: Set(content),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let names = nicknames(&txn, [actor.user_id.clone()]).await?;
    txn.commit().await?;

    Ok(CommentView {
        nickname: nickname_or_placeholder(&names, &actor.user_id),
        comment,
    })
}

pub async fn delete_comment(
    db: &DatabaseConnection,
    actor: &ActorContext,
    comment_id: i32,
) -> Result<(), DomainError> {
    load_owned::<quote_comment::Entity, _>(db, actor, comment_id, "Comment").await?;
    quote_comment::Entity::delete_by_id(comment_id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_limits() {
        assert_eq!(validate_text(" 한 문장 ", "Quote", 10).unwrap(), "한 문장");
        assert!(validate_text("", "Quote", 10).is_err());
        assert!(validate_text("가나다라마바사아자차카", "Quote", 10).is_err());
        assert!(validate_text("가나다라마바사아자차", "Quote", 10).is_ok());
    }
}
