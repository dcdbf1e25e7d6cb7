use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::search_books,
        api::books::bestsellers,
        api::books::new_arrivals,
        api::books::get_book,
        api::user_books::list_user_books,
        api::user_books::add_user_book,
        api::user_books::update_user_book,
        api::user_books::remove_user_book,
        api::reviews::list_reviews,
        api::reviews::create_review,
        api::reviews::update_review,
        api::reviews::delete_review,
        api::likes::toggle_review_like,
        api::likes::toggle_quote_like,
        api::quotes::list_quotes,
        api::quotes::create_quote,
        api::quotes::delete_quote,
        api::quotes::list_comments,
        api::quotes::create_comment,
        api::quotes::delete_comment,
        api::stats::get_monthly_goal,
        api::stats::set_monthly_goal,
        api::stats::genre_trend,
        api::stats::reading_trend,
        api::stats::activity_ranking,
        api::profile::get_profile,
        api::profile::update_profile,
    ),
    tags(
        (name = "readmate", description = "Readmate reading tracker API")
    )
)]
pub struct ApiDoc;
