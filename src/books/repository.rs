use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Database;
use crate::error::StoreError;
use crate::model::{Book, BookId};

/// Identifier-keyed persistence for books.
///
/// Implementations own every stored record. None of the operations coordinate
/// with each other: a `find_by_id` followed by `save` is not atomic.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Stores a new book with no comments and returns its freshly assigned id.
    async fn insert(&self, title: &str) -> Result<BookId, StoreError>;

    /// All books in store order.
    async fn find_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// Finds and removes in one step, returning the removed record.
    async fn delete_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError>;

    /// Returns the number of removed records.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    /// Overwrites the stored record with the same id. Returns `false` when it no longer exists.
    async fn save(&self, book: &Book) -> Result<bool, StoreError>;
}

const BOOK_COLUMNS: &str = "id, title, comments, commentcount";

pub struct LibsqlBookRepository {
    db: Arc<Database>,
}

impl LibsqlBookRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn row_to_book(row: &libsql::Row) -> Result<Book, StoreError> {
        let raw_id: String = row.get(0)?;
        let id = BookId::parse(&raw_id).ok_or_else(|| StoreError::InvalidRow(format!("invalid book id {}", raw_id)))?;
        let comments: String = row.get(2)?;

        Ok(Book {
            id,
            title: row.get(1)?,
            comments: serde_json::from_str(&comments)?,
            comment_count: row.get(3)?,
        })
    }

    async fn query_books(&self, query: &str, params: impl libsql::params::IntoParams) -> Result<Vec<Book>, StoreError> {
        let mut rows = self.db.connection().query(query, params).await?;
        let mut books = Vec::new();

        while let Some(row) = rows.next().await? {
            books.push(Self::row_to_book(&row)?);
        }

        Ok(books)
    }
}

#[async_trait]
impl BookRepository for LibsqlBookRepository {
    async fn insert(&self, title: &str) -> Result<BookId, StoreError> {
        let id = BookId::generate();
        self.db
            .connection()
            .execute(
                "INSERT INTO books (id, title, comments, commentcount) VALUES (?, ?, '[]', 0)",
                libsql::params![id.to_string(), title],
            )
            .await?;
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let query = format!("SELECT {} FROM books ORDER BY seq", BOOK_COLUMNS);
        self.query_books(&query, ()).await
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let query = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
        let books = self.query_books(&query, libsql::params![id.to_string()]).await?;
        Ok(books.into_iter().next())
    }

    async fn delete_by_id(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let query = format!("DELETE FROM books WHERE id = ? RETURNING {}", BOOK_COLUMNS);
        let books = self.query_books(&query, libsql::params![id.to_string()]).await?;
        Ok(books.into_iter().next())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        Ok(self.db.connection().execute("DELETE FROM books", ()).await?)
    }

    async fn save(&self, book: &Book) -> Result<bool, StoreError> {
        let comments = serde_json::to_string(&book.comments)?;
        let updated = self
            .db
            .connection()
            .execute(
                r#"
                UPDATE books
                SET title = ?, comments = ?, commentcount = ?,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                WHERE id = ?
                "#,
                libsql::params![book.title.as_str(), comments, book.comment_count, book.id.to_string()],
            )
            .await?;
        Ok(updated > 0)
    }
}
