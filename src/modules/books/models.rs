use serde::{Deserialize, Serialize};

/// A stored book. Every field is required and `isbn` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Fields an update overwrites. Absent fields keep their stored value; the
/// key itself is never part of a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookChanges {
    pub amazon_url: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub pages: Option<i64>,
    pub publisher: Option<String>,
    pub title: Option<String>,
    pub year: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

#[derive(Debug, Clone, Serialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
