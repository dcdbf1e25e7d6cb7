pub mod books;
pub mod error;
pub mod health;
pub mod likes;
pub mod profile;
pub mod quotes;
pub mod reviews;
pub mod stats;
pub mod user_books;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::NaiveDate;

use crate::infrastructure::AppState;

/// Current UTC date; month windows share the clock used for stored timestamps
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Catalog
        .route("/books/search", get(books::search_books))
        .route("/books/bestsellers", get(books::bestsellers))
        .route("/books/new", get(books::new_arrivals))
        .route("/books/:id", get(books::get_book))
        // Library
        .route(
            "/user-books",
            get(user_books::list_user_books)
                .post(user_books::add_user_book)
                .patch(user_books::update_user_book)
                .delete(user_books::remove_user_book),
        )
        // Reviews
        .route(
            "/reviews",
            get(reviews::list_reviews)
                .post(reviews::create_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        // Likes
        .route("/review-likes", post(likes::toggle_review_like))
        .route("/quote-likes", post(likes::toggle_quote_like))
        // Quotes
        .route(
            "/quotes",
            get(quotes::list_quotes)
                .post(quotes::create_quote)
                .delete(quotes::delete_quote),
        )
        .route(
            "/quote-comments",
            get(quotes::list_comments)
                .post(quotes::create_comment)
                .delete(quotes::delete_comment),
        )
        // Goals & stats
        .route(
            "/goals/monthly",
            get(stats::get_monthly_goal).post(stats::set_monthly_goal),
        )
        .route("/stats/genres", get(stats::genre_trend))
        .route("/stats/reading-trend", get(stats::reading_trend))
        .route("/stats/activity-ranking", get(stats::activity_ranking))
        // Profile
        .route(
            "/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .with_state(state)
}
