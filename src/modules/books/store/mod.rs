//! Data access for the `booklist` collection.
//!
//! [`BookStore`] is the seam between the HTTP handlers and persistence.
//! [`MongoBookStore`] talks to MongoDB; [`InMemoryBookStore`] keeps the same
//! semantics in process for tests and local runs without a database.

mod memory;
mod mongo;

pub use memory::InMemoryBookStore;
pub use mongo::MongoBookStore;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use super::models::{BookListing, CreateBookListing, DeleteConfirmation, UpdateBookListing};

/// Store operations, used for log messages and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetBook,
    GetBooks,
    GetBooksByAuthor,
    CreateBook,
    UpdateBook,
    DeleteBook,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GetBook => "get_book",
            Operation::GetBooks => "get_books",
            Operation::GetBooksByAuthor => "get_books_by_author",
            Operation::CreateBook => "create_book",
            Operation::UpdateBook => "update_book",
            Operation::DeleteBook => "delete_book",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Operation::GetBook => "book fetched successfully",
            Operation::GetBooks | Operation::GetBooksByAuthor => "books fetched successfully",
            Operation::CreateBook => "book created successfully",
            Operation::UpdateBook => "book successfully updated by id",
            Operation::DeleteBook => "book deleted successfully",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Operation::GetBook | Operation::GetBooks | Operation::GetBooksByAuthor => {
                "error while fetching book"
            }
            Operation::CreateBook => "error while creating book",
            Operation::UpdateBook => "error while updating book by id",
            Operation::DeleteBook => "error while deleting book",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum BookStoreError {
    #[error("'{id}' is not a valid book id")]
    InvalidId { id: String },

    #[error("book '{id}' not found")]
    NotFound { id: String },

    #[error("{operation} timed out")]
    Timeout { operation: Operation },

    #[error("{operation} failed: {source}")]
    Database {
        operation: Operation,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("store returned a non-ObjectId inserted id")]
    MissingInsertedId,
}

/// CRUD operations over book listings.
///
/// Every call is an independent round trip; implementations hold no state
/// beyond their connection (or in-process collection).
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<BookListing, BookStoreError>;

    /// Every listing in store order.
    async fn get_all(&self) -> Result<Vec<BookListing>, BookStoreError>;

    /// Listings whose author equals `author` exactly (case-sensitive).
    async fn get_by_author(&self, author: &str) -> Result<Vec<BookListing>, BookStoreError>;

    /// Insert a listing. The result is built from `input`, not re-read.
    async fn create(&self, input: CreateBookListing) -> Result<BookListing, BookStoreError>;

    /// Apply a partial update and return the document as stored afterwards.
    async fn update(
        &self,
        id: &str,
        input: UpdateBookListing,
    ) -> Result<BookListing, BookStoreError>;

    /// Delete at most one listing. Deleting an absent id is not an error.
    async fn delete_by_id(&self, id: &str) -> Result<DeleteConfirmation, BookStoreError>;
}

/// Decode an external hex id into the stored identifier.
pub fn parse_book_id(id: &str) -> Result<ObjectId, BookStoreError> {
    ObjectId::parse_str(id).map_err(|_| BookStoreError::InvalidId { id: id.to_string() })
}

/// Log the outcome of a store operation and hand the result back.
fn record<T>(
    operation: Operation,
    book_id: Option<&str>,
    result: Result<T, BookStoreError>,
) -> Result<T, BookStoreError> {
    let book_id = book_id.unwrap_or_default();
    match &result {
        Ok(_) => tracing::info!(
            operation = %operation,
            book_id,
            "{}",
            operation.success_message()
        ),
        Err(err @ (BookStoreError::InvalidId { .. } | BookStoreError::NotFound { .. })) => {
            tracing::warn!(
                operation = %operation,
                book_id,
                error = %err,
                "{}",
                operation.failure_message()
            )
        }
        Err(err) => tracing::error!(
            operation = %operation,
            book_id,
            error = %err,
            "{}",
            operation.failure_message()
        ),
    }
    result
}
