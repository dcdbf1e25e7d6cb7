//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait, Value,
};

use crate::domain::{BookDraft, BookRepository, DomainError};
use crate::models::Book;
use crate::models::book::{ActiveModel, Column, Entity as BookEntity};

/// Insert keyed by ISBN. A concurrent reconciliation that already created the
/// row turns this into a field merge that keeps non-null local values.
const UPSERT_BY_ISBN: &str = r#"
    INSERT INTO books (title, author, publisher, category, isbn, cover_url, description, pub_date, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(isbn) DO UPDATE SET
        title = excluded.title,
        author = COALESCE(excluded.author, books.author),
        publisher = COALESCE(excluded.publisher, books.publisher),
        category = COALESCE(excluded.category, books.category),
        cover_url = COALESCE(excluded.cover_url, books.cover_url),
        description = COALESCE(excluded.description, books.description),
        pub_date = COALESCE(excluded.pub_date, books.pub_date),
        updated_at = excluded.updated_at
"#;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<Book>, DomainError> {
        let model = BookEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Book::from))
    }

    async fn find_by_isbns(&self, isbns: &[String]) -> Result<Vec<Book>, DomainError> {
        if isbns.is_empty() {
            return Ok(Vec::new());
        }

        let books = BookEntity::find()
            .filter(Column::Isbn.is_in(isbns.iter().cloned()))
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<Book>, DomainError> {
        let q = query.trim();
        if q.is_empty() {
            return Ok(Vec::new());
        }

        let books = BookEntity::find()
            .filter(
                Condition::any()
                    .add(Column::Title.contains(q))
                    .add(Column::Author.contains(q)),
            )
            .order_by_asc(Column::Title)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(books.into_iter().map(Book::from).collect())
    }

    async fn apply_reconciliation(
        &self,
        updates: Vec<(i32, BookDraft)>,
        inserts: Vec<BookDraft>,
    ) -> Result<(), DomainError> {
        if updates.is_empty() && inserts.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.db.begin().await?;

        for (id, draft) in updates {
            let active = ActiveModel {
                id: Set(id),
                title: Set(draft.title),
                author: Set(draft.author),
                publisher: Set(draft.publisher),
                category: Set(draft.category),
                isbn: Set(draft.isbn),
                cover_url: Set(draft.cover_url),
                description: Set(draft.description),
                pub_date: Set(draft.pub_date),
                updated_at: Set(now.clone()),
                ..Default::default()
            };
            active.update(&txn).await?;
        }

        for draft in inserts {
            let values: [Value; 10] = [
                draft.title.into(),
                draft.author.into(),
                draft.publisher.into(),
                draft.category.into(),
                draft.isbn.into(),
                draft.cover_url.into(),
                draft.description.into(),
                draft.pub_date.into(),
                now.clone().into(),
                now.clone().into(),
            ];
            txn.execute(Statement::from_sql_and_values(
                txn.get_database_backend(),
                UPSERT_BY_ISBN,
                values,
            ))
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}
