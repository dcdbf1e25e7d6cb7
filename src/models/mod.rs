pub mod book;
pub mod monthly_goal;
pub mod profile;
pub mod quote;
pub mod quote_comment;
pub mod quote_like;
pub mod review;
pub mod review_like;
pub mod user_book;

pub use book::Book;
pub use user_book::ReadingStatus;
