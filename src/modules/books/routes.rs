use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shelf_http::{AppError, JsonBody};

use super::models::{BookResponse, BooksResponse, MessageResponse};
use super::service::BookService;

type SharedService = State<Arc<BookService>>;

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(service)
}

/// GET /books => {books: [...]}
async fn list_books(State(service): SharedService) -> Result<Json<BooksResponse>, AppError> {
    let books = service.list().await?;
    Ok(Json(BooksResponse { books }))
}

/// GET /books/{isbn} => {book: {...}}
async fn get_book(
    State(service): SharedService,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = service.get(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

/// POST /books => 201 {book: {...}}
async fn create_book(
    State(service): SharedService,
    JsonBody(payload): JsonBody<Value>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

/// PUT /books/{isbn} => {book: {...}}
async fn update_book(
    State(service): SharedService,
    Path(isbn): Path<String>,
    JsonBody(payload): JsonBody<Value>,
) -> Result<Json<BookResponse>, AppError> {
    let book = service.update(&isbn, payload).await?;
    Ok(Json(BookResponse { book }))
}

/// DELETE /books/{isbn} => {message: "Book deleted"}
async fn delete_book(
    State(service): SharedService,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    service.delete(&isbn).await?;
    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}
