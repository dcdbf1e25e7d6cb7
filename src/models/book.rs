use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::NormalizedBook;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    #[sea_orm(unique)]
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_book::Entity")]
    UserBooks,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::quote::Entity")]
    Quotes,
}

impl Related<super::user_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserBooks.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quotes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// DTO for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// `None` for catalog items that never reached the local store
    pub id: Option<i32>,
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: Some(model.id),
            title: model.title,
            author: model.author,
            publisher: model.publisher,
            category: model.category,
            isbn: model.isbn,
            cover_url: model.cover_url,
            description: model.description,
            pub_date: model.pub_date,
            rank: None,
        }
    }
}

impl Book {
    /// Wrap a catalog item with the local id it resolved to, if any
    pub fn from_catalog(item: NormalizedBook, id: Option<i32>) -> Self {
        Self {
            id,
            title: item.title,
            author: item.author,
            publisher: item.publisher,
            category: item.category,
            isbn: item.isbn,
            cover_url: item.cover,
            description: item.description,
            pub_date: item.pub_date,
            rank: item.rank,
        }
    }
}
