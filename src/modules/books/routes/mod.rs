//! HTTP handlers for the Books module.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use booklist_http::error::AppError;
use serde_json::json;

use super::models::{
    BookListing, CreateBookListing, DeleteConfirmation, ListBooksQuery, UpdateBookListing,
};
use super::store::{BookStore, BookStoreError};

pub type SharedBookStore = Arc<dyn BookStore>;

impl From<BookStoreError> for AppError {
    fn from(err: BookStoreError) -> Self {
        match err {
            BookStoreError::InvalidId { .. } => AppError::validation(
                vec![json!({"field": "id", "error": "invalid_object_id"})],
                err.to_string(),
            ),
            BookStoreError::NotFound { .. } => AppError::not_found(err.to_string()),
            BookStoreError::Timeout { .. }
            | BookStoreError::Database { .. }
            | BookStoreError::MissingInsertedId => AppError::internal(err),
        }
    }
}

/// Routes mounted under `/api/books`.
pub fn router(store: SharedBookStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        // Static segment wins over `/{id}`; other methods on it get the 405 envelope.
        .route("/health", get(health_check))
        .route(
            "/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// List every book, or only those whose author matches `?author=` exactly
async fn list_books(
    State(store): State<SharedBookStore>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookListing>>, AppError> {
    let books = match query.author {
        Some(author) => store.get_by_author(&author).await?,
        None => store.get_all().await?,
    };
    Ok(Json(books))
}

async fn get_book(
    State(store): State<SharedBookStore>,
    Path(id): Path<String>,
) -> Result<Json<BookListing>, AppError> {
    Ok(Json(store.get_by_id(&id).await?))
}

async fn create_book(
    State(store): State<SharedBookStore>,
    payload: Result<Json<CreateBookListing>, JsonRejection>,
) -> Result<(StatusCode, Json<BookListing>), AppError> {
    let Json(input) = payload.map_err(rejection_to_error)?;
    let book = store.create(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(store): State<SharedBookStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookListing>, JsonRejection>,
) -> Result<Json<BookListing>, AppError> {
    let Json(input) = payload.map_err(rejection_to_error)?;
    Ok(Json(store.update(&id, input).await?))
}

async fn delete_book(
    State(store): State<SharedBookStore>,
    Path(id): Path<String>,
) -> Result<Json<DeleteConfirmation>, AppError> {
    Ok(Json(store.delete_by_id(&id).await?))
}

/// Keep body errors in the common error envelope
fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            AppError::validation(vec![json!({"error": err.body_text()})], "invalid book payload")
        }
        JsonRejection::MissingJsonContentType(err) => {
            AppError::unsupported_media_type(err.body_text())
        }
        other => AppError::bad_request(other.body_text()),
    }
}
