//! Record service: validates writes, then calls the store.

use std::sync::Arc;

use serde_json::Value;
use shelf_db::DbError;
use shelf_http::AppError;
use shelf_kernel::schema::{validate, Mode, Schema};

use super::models::{Book, BookChanges};
use super::store::BookStore;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("book failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("There is no book with an isbn of '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(messages) => AppError::validation(messages),
            ServiceError::Storage(e) => AppError::Internal(e.into()),
            missing @ ServiceError::NotFound(_) => AppError::not_found(missing.to_string()),
        }
    }
}

/// Orchestrates the five book operations. Holds no per-request state.
pub struct BookService {
    store: Arc<dyn BookStore>,
    schema: Arc<Schema>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>, schema: Arc<Schema>) -> Self {
        Self { store, schema }
    }

    pub async fn list(&self) -> Result<Vec<Book>, ServiceError> {
        Ok(self.store.find_all().await?)
    }

    pub async fn get(&self, isbn: &str) -> Result<Book, ServiceError> {
        self.store
            .find(isbn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(isbn.to_string()))
    }

    /// Strictly validate `payload` and insert it. Nothing reaches the store
    /// unless the whole record is valid.
    pub async fn create(&self, mut payload: Value) -> Result<Book, ServiceError> {
        validate(&self.schema, &payload, Mode::Strict)
            .map_err(|errors| ServiceError::Validation(errors.into_messages()))?;
        self.schema.normalize(&mut payload);

        let book: Book = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(vec![e.to_string()]))?;

        let stored = self.store.insert(&book).await?;
        tracing::info!(isbn = %stored.isbn, "book created");
        Ok(stored)
    }

    /// Validate only the fields present in `payload` and overwrite them.
    ///
    /// `isbn` may be echoed back in the payload but must equal the key.
    pub async fn update(&self, isbn: &str, mut payload: Value) -> Result<Book, ServiceError> {
        let mut messages = match validate(&self.schema, &payload, Mode::Partial) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.into_messages(),
        };

        if let Some(requested) = payload.get("isbn").and_then(Value::as_str) {
            if requested != isbn {
                messages.push(format!("instance.isbn cannot be changed from \"{}\"", isbn));
            }
        }

        if !messages.is_empty() {
            return Err(ServiceError::Validation(messages));
        }
        self.schema.normalize(&mut payload);

        let changes: BookChanges = serde_json::from_value(payload)
            .map_err(|e| ServiceError::Validation(vec![e.to_string()]))?;

        let updated = self
            .store
            .update(isbn, &changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound(isbn.to_string()))?;

        tracing::info!(isbn = %updated.isbn, "book updated");
        Ok(updated)
    }

    pub async fn delete(&self, isbn: &str) -> Result<(), ServiceError> {
        if !self.store.delete(isbn).await? {
            return Err(ServiceError::NotFound(isbn.to_string()));
        }

        tracing::info!(isbn, "book deleted");
        Ok(())
    }
}
