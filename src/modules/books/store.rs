//! Storage primitives for books.

use async_trait::async_trait;
use shelf_db::{Database, DbError};

use super::models::{Book, BookChanges};

pub const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE books (
    isbn       TEXT PRIMARY KEY,
    amazon_url TEXT NOT NULL,
    author     TEXT NOT NULL,
    language   TEXT NOT NULL,
    pages      INTEGER NOT NULL CHECK (pages >= 0),
    publisher  TEXT NOT NULL,
    title      TEXT NOT NULL,
    year       INTEGER NOT NULL
) STRICT;
"#;

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

/// Key-based access to stored books. Absence is reported through `None` or
/// `false`, never through an error.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, in storage order.
    async fn find_all(&self) -> Result<Vec<Book>, DbError>;

    async fn find(&self, isbn: &str) -> Result<Option<Book>, DbError>;

    /// Insert a new book and return it as stored.
    async fn insert(&self, book: &Book) -> Result<Book, DbError>;

    /// Overwrite the given fields. Returns `None` if no book has `isbn`.
    async fn update(&self, isbn: &str, changes: &BookChanges) -> Result<Option<Book>, DbError>;

    /// Returns `false` if no book has `isbn`.
    async fn delete(&self, isbn: &str) -> Result<bool, DbError>;
}

/// [`BookStore`] backed by the `books` table.
pub struct SqliteBookStore {
    db: Database,
}

impl SqliteBookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn find_all(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books"))
            .fetch_all(self.db.pool())
            .await?;
        Ok(books)
    }

    async fn find(&self, isbn: &str) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE isbn = ?"))
            .bind(isbn)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(book)
    }

    async fn insert(&self, book: &Book) -> Result<Book, DbError> {
        let stored = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(self.db.pool())
        .await?;

        tracing::debug!(isbn = %stored.isbn, "book inserted");
        Ok(stored)
    }

    async fn update(&self, isbn: &str, changes: &BookChanges) -> Result<Option<Book>, DbError> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET \
                 amazon_url = COALESCE(?, amazon_url), \
                 author = COALESCE(?, author), \
                 language = COALESCE(?, language), \
                 pages = COALESCE(?, pages), \
                 publisher = COALESCE(?, publisher), \
                 title = COALESCE(?, title), \
                 year = COALESCE(?, year) \
             WHERE isbn = ? \
             RETURNING {COLUMNS}"
        ))
        .bind(changes.amazon_url.as_deref())
        .bind(changes.author.as_deref())
        .bind(changes.language.as_deref())
        .bind(changes.pages)
        .bind(changes.publisher.as_deref())
        .bind(changes.title.as_deref())
        .bind(changes.year)
        .bind(isbn)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(updated)
    }

    async fn delete(&self, isbn: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
