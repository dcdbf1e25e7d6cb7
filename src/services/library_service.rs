//! Library Service - a user's shelf of books with reading status
//!
//! Entries are always addressed as (caller, book), so ownership is implied by
//! the lookup key.

use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::str::FromStr;

use crate::domain::DomainError;
use crate::infrastructure::auth::ActorContext;
use crate::models::user_book::{self, Entity as UserBookEntity, ReadingStatus};
use crate::models::{Book, book};

/// The mutable part of a library entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryState {
    pub status: ReadingStatus,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub emotion_tag: Option<String>,
}

impl Default for EntryState {
    fn default() -> Self {
        Self {
            status: ReadingStatus::Want,
            started_at: None,
            finished_at: None,
            emotion_tag: None,
        }
    }
}

impl From<&user_book::Model> for EntryState {
    fn from(model: &user_book::Model) -> Self {
        Self {
            status: ReadingStatus::from_str(&model.status).unwrap_or(ReadingStatus::Want),
            started_at: model.started_at.clone(),
            finished_at: model.finished_at.clone(),
            emotion_tag: model.emotion_tag.clone(),
        }
    }
}

/// Apply a status change and/or emotion tag to an entry.
///
/// - reading: `started_at` = today unless already set
/// - finished: `started_at` = today unless set, `finished_at` = today
/// - want: both dates cleared
/// - emotion tag: overwritten when given, empty string clears it
pub fn apply_transition(
    current: &EntryState,
    new_status: Option<ReadingStatus>,
    emotion_tag: Option<&str>,
    today: NaiveDate,
) -> EntryState {
    let mut next = current.clone();
    let today = today.format("%Y-%m-%d").to_string();

    if let Some(status) = new_status {
        next.status = status;
        match status {
            ReadingStatus::Reading => {
                next.started_at.get_or_insert_with(|| today.clone());
            }
            ReadingStatus::Finished => {
                next.started_at.get_or_insert_with(|| today.clone());
                next.finished_at = Some(today.clone());
            }
            ReadingStatus::Want => {
                next.started_at = None;
                next.finished_at = None;
            }
        }
    }

    if let Some(tag) = emotion_tag {
        let tag = tag.trim();
        next.emotion_tag = (!tag.is_empty()).then(|| tag.to_string());
    }

    next
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    #[serde(flatten)]
    pub entry: user_book::Model,
    pub book: Option<Book>,
}

pub fn parse_status(raw: &str) -> Result<ReadingStatus, DomainError> {
    ReadingStatus::from_str(raw.trim())
        .map_err(|_| DomainError::validation("status must be one of want, reading, finished"))
}

async fn find_entry(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
) -> Result<Option<user_book::Model>, DomainError> {
    Ok(UserBookEntity::find()
        .filter(user_book::Column::UserId.eq(actor.user_id.as_str()))
        .filter(user_book::Column::BookId.eq(book_id))
        .one(db)
        .await?)
}

pub async fn list_entries(
    db: &DatabaseConnection,
    actor: &ActorContext,
    status: Option<ReadingStatus>,
) -> Result<Vec<LibraryEntry>, DomainError> {
    let mut query = UserBookEntity::find().filter(user_book::Column::UserId.eq(actor.user_id.as_str()));
    if let Some(status) = status {
        query = query.filter(user_book::Column::Status.eq(status.as_str()));
    }

    let rows = query
        .order_by_desc(user_book::Column::UpdatedAt)
        .find_also_related(book::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, book)| LibraryEntry {
            entry,
            book: book.map(Book::from),
        })
        .collect())
}

pub async fn get_entry(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
) -> Result<Option<user_book::Model>, DomainError> {
    find_entry(db, actor, book_id).await
}

/// Add a book to the caller's library. Returns the entry and whether it was
/// newly created; an existing entry is returned unchanged.
pub async fn add_entry(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
    status: Option<ReadingStatus>,
    emotion_tag: Option<&str>,
    today: NaiveDate,
) -> Result<(user_book::Model, bool), DomainError> {
    book::Entity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;

    if let Some(existing) = find_entry(db, actor, book_id).await? {
        return Ok((existing, false));
    }

    let state = apply_transition(
        &EntryState::default(),
        Some(status.unwrap_or(ReadingStatus::Want)),
        emotion_tag,
        today,
    );
    let now = chrono::Utc::now().to_rfc3339();

    let row = user_book::ActiveModel {
        user_id: Set(actor.user_id.clone()),
        book_id: Set(book_id),
        status: Set(state.status.to_string()),
        started_at: Set(state.started_at),
        finished_at: Set(state.finished_at),
        emotion_tag: Set(state.emotion_tag),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    // A concurrent add of the same book resolves on the unique key
    let inserted = UserBookEntity::insert(row)
        .on_conflict(
            OnConflict::columns([user_book::Column::UserId, user_book::Column::BookId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let entry = find_entry(db, actor, book_id)
        .await?
        .ok_or_else(|| DomainError::Database("library entry vanished after insert".into()))?;

    tracing::info!(
        "User {} added book {} as {}",
        actor.user_id,
        book_id,
        entry.status
    );
    Ok((entry, inserted > 0))
}

pub async fn update_entry(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
    status: Option<ReadingStatus>,
    emotion_tag: Option<&str>,
    today: NaiveDate,
) -> Result<user_book::Model, DomainError> {
    if status.is_none() && emotion_tag.is_none() {
        return Err(DomainError::validation("Nothing to update: provide status or emotionTag"));
    }

    let current = find_entry(db, actor, book_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Library entry"))?;

    let next = apply_transition(&EntryState::from(&current), status, emotion_tag, today);

    let mut active: user_book::ActiveModel = current.into();
    active.status = Set(next.status.to_string());
    active.started_at = Set(next.started_at);
    active.finished_at = Set(next.finished_at);
    active.emotion_tag = Set(next.emotion_tag);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    Ok(active.update(db).await?)
}

pub async fn remove_entry(
    db: &DatabaseConnection,
    actor: &ActorContext,
    book_id: i32,
) -> Result<(), DomainError> {
    let result = UserBookEntity::delete_many()
        .filter(user_book::Column::UserId.eq(actor.user_id.as_str()))
        .filter(user_book::Column::BookId.eq(book_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Library entry"));
    }
    Ok(())
}
