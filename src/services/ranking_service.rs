//! Dashboards: activity ranking, genre trend, reading trend.
//!
//! Every window is a calendar month on the UTC clock. The pure functions
//! take `today` so callers (and tests) pin the clock explicitly.

use chrono::{Datelike, Duration, NaiveDate};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect,
};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::DomainError;
use crate::infrastructure::auth::ActorContext;
use crate::models::{book, quote_comment, quote_like, review_like, user_book};
use crate::services::profile_service::{nickname_or_placeholder, nicknames};

pub const UNCATEGORIZED: &str = "uncategorized";
pub const RANKING_SIZE: usize = 5;
pub const TREND_MONTHS: usize = 12;

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

pub fn next_month_start(day: NaiveDate) -> NaiveDate {
    month_start(month_start(day) + Duration::days(32))
}

/// `[first day of month, first day of next month)` as ISO date strings, which
/// compare correctly against both `YYYY-MM-DD` dates and RFC 3339 timestamps.
pub fn month_bounds(today: NaiveDate) -> (String, String) {
    (
        month_start(today).format("%Y-%m-%d").to_string(),
        next_month_start(today).format("%Y-%m-%d").to_string(),
    )
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActivityCounts {
    pub finished: u64,
    pub comments: u64,
    pub likes: u64,
}

impl ActivityCounts {
    /// Score in tenths: 0.5·finished + 0.3·comments + 0.2·likes, kept integral
    /// so ties compare exactly.
    pub fn score_tenths(&self) -> u64 {
        5 * self.finished + 3 * self.comments + 2 * self.likes
    }

    pub fn score(&self) -> f64 {
        self.score_tenths() as f64 / 10.0
    }
}

/// Order users by score, then finished, likes, comments (all descending).
/// Zero scores are dropped; user id breaks any remaining tie.
pub fn rank_activity(
    counts: HashMap<String, ActivityCounts>,
    limit: usize,
) -> Vec<(String, ActivityCounts)> {
    let mut ranked: Vec<(String, ActivityCounts)> = counts
        .into_iter()
        .filter(|(_, c)| c.score_tenths() > 0)
        .collect();

    ranked.sort_by(|(a_id, a), (b_id, b)| {
        (
            Reverse(a.score_tenths()),
            Reverse(a.finished),
            Reverse(a.likes),
            Reverse(a.comments),
            a_id,
        )
            .cmp(&(
                Reverse(b.score_tenths()),
                Reverse(b.finished),
                Reverse(b.likes),
                Reverse(b.comments),
                b_id,
            ))
    });

    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub user_id: String,
    pub nickname: String,
    pub score: f64,
    pub finished_count: u64,
    pub comment_count: u64,
    pub like_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub category: String,
    pub count: u64,
}

/// Count categories, bucketing blank ones as "uncategorized"; largest first
pub fn genre_counts(categories: impl IntoIterator<Item = Option<String>>) -> Vec<GenreCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for category in categories {
        let key = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut genres: Vec<GenreCount> = counts
        .into_iter()
        .map(|(category, count)| GenreCount { category, count })
        .collect();
    genres.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    genres
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
    pub cumulative: u64,
}

/// First day of each of the trailing `TREND_MONTHS` months, oldest first,
/// ending with the current month
pub fn trailing_months(today: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::with_capacity(TREND_MONTHS);
    let mut cursor = month_start(today);
    for _ in 0..TREND_MONTHS {
        months.push(cursor);
        cursor = month_start(cursor - Duration::days(1));
    }
    months.reverse();
    months
}

/// Bucket finish dates (`YYYY-MM-DD…`) into the trailing months, zero-filling
/// gaps and carrying a running total. Dates outside the window are ignored.
pub fn monthly_series<'a>(
    today: NaiveDate,
    finished_dates: impl IntoIterator<Item = &'a str>,
) -> Vec<TrendPoint> {
    let mut per_month: HashMap<&str, u64> = HashMap::new();
    for date in finished_dates {
        if let Some(month) = date.get(..7) {
            *per_month.entry(month).or_insert(0) += 1;
        }
    }

    let mut cumulative = 0;
    trailing_months(today)
        .into_iter()
        .map(|start| {
            let month = start.format("%Y-%m").to_string();
            let count = per_month.get(month.as_str()).copied().unwrap_or(0);
            cumulative += count;
            TrendPoint {
                month,
                count,
                cumulative,
            }
        })
        .collect()
}

/// User ids from rows whose `time_col` falls in `[start, end)` and that match
/// `extra` when given, counted per user
async fn count_users_between<E, C>(
    conn: &C,
    user_col: E::Column,
    time_col: E::Column,
    start: &str,
    end: &str,
    extra: Option<Condition>,
) -> Result<HashMap<String, u64>, DomainError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut window = Condition::all()
        .add(time_col.gte(start))
        .add(time_col.lt(end));
    if let Some(extra) = extra {
        window = window.add(extra);
    }

    let users: Vec<String> = E::find()
        .select_only()
        .column(user_col)
        .filter(window)
        .into_tuple()
        .all(conn)
        .await?;

    let mut counts = HashMap::new();
    for user in users {
        *counts.entry(user).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Finished entries for one user in the month containing `today`
pub async fn finished_this_month<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    today: NaiveDate,
) -> Result<u64, DomainError> {
    use sea_orm::PaginatorTrait;

    let (start, end) = month_bounds(today);
    let count = user_book::Entity::find()
        .filter(user_book::Column::UserId.eq(user_id))
        .filter(user_book::Column::Status.eq("finished"))
        .filter(user_book::Column::FinishedAt.gte(start))
        .filter(user_book::Column::FinishedAt.lt(end))
        .count(conn)
        .await?;
    Ok(count)
}

pub async fn activity_ranking(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<RankingEntry>, DomainError> {
    let (start, end) = month_bounds(today);

    let finished = count_users_between::<user_book::Entity, _>(
        db,
        user_book::Column::UserId,
        user_book::Column::FinishedAt,
        &start,
        &end,
        Some(Condition::all().add(user_book::Column::Status.eq("finished"))),
    )
    .await?;
    let comments = count_users_between::<quote_comment::Entity, _>(
        db,
        quote_comment::Column::UserId,
        quote_comment::Column::CreatedAt,
        &start,
        &end,
        None,
    )
    .await?;
    let review_likes = count_users_between::<review_like::Entity, _>(
        db,
        review_like::Column::UserId,
        review_like::Column::CreatedAt,
        &start,
        &end,
        None,
    )
    .await?;
    let quote_likes = count_users_between::<quote_like::Entity, _>(
        db,
        quote_like::Column::UserId,
        quote_like::Column::CreatedAt,
        &start,
        &end,
        None,
    )
    .await?;

    let mut counts: HashMap<String, ActivityCounts> = HashMap::new();
    for (user, n) in finished {
        counts.entry(user).or_default().finished += n;
    }
    for (user, n) in comments {
        counts.entry(user).or_default().comments += n;
    }
    for (user, n) in review_likes.into_iter().chain(quote_likes) {
        counts.entry(user).or_default().likes += n;
    }

    let ranked = rank_activity(counts, RANKING_SIZE);
    let names = nicknames(db, ranked.iter().map(|(id, _)| id.clone())).await?;

    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, c))| RankingEntry {
            rank: i + 1,
            nickname: nickname_or_placeholder(&names, &user_id),
            user_id,
            score: c.score(),
            finished_count: c.finished,
            comment_count: c.comments,
            like_count: c.likes,
        })
        .collect())
}

pub async fn genre_trend(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<GenreCount>, DomainError> {
    let (start, end) = month_bounds(today);

    let rows = user_book::Entity::find()
        .filter(user_book::Column::Status.eq("finished"))
        .filter(user_book::Column::FinishedAt.gte(start))
        .filter(user_book::Column::FinishedAt.lt(end))
        .find_also_related(book::Entity)
        .all(db)
        .await?;

    Ok(genre_counts(
        rows.into_iter().map(|(_, book)| book.and_then(|b| b.category)),
    ))
}

pub async fn reading_trend(
    db: &DatabaseConnection,
    actor: &ActorContext,
    today: NaiveDate,
) -> Result<Vec<TrendPoint>, DomainError> {
    let window_start = trailing_months(today)
        .first()
        .copied()
        .unwrap_or_else(|| month_start(today))
        .format("%Y-%m-%d")
        .to_string();
    let (_, window_end) = month_bounds(today);

    let dates: Vec<Option<String>> = user_book::Entity::find()
        .select_only()
        .column(user_book::Column::FinishedAt)
        .filter(user_book::Column::UserId.eq(actor.user_id.as_str()))
        .filter(user_book::Column::Status.eq("finished"))
        .filter(user_book::Column::FinishedAt.gte(window_start))
        .filter(user_book::Column::FinishedAt.lt(window_end))
        .into_tuple()
        .all(db)
        .await?;

    Ok(monthly_series(today, dates.iter().flatten().map(String::as_str)))
}
