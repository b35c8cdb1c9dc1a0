use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::ReturnDocument,
    Collection, Database,
};

use booklist_kernel::settings::DatabaseSettings;

use super::{parse_book_id, record, BookStore, BookStoreError, Operation};
use crate::modules::books::models::{
    BookListing, CreateBookListing, DeleteConfirmation, NewBookDocument, StoredBookDocument,
    UpdateBookListing,
};
use crate::utils::unix_timestamp_now;

/// [`BookStore`] backed by a MongoDB collection.
#[derive(Clone)]
pub struct MongoBookStore {
    database: Database,
    books: Collection<StoredBookDocument>,
    timeout: Duration,
}

impl MongoBookStore {
    /// Connect to the configured deployment and bind to the book collection.
    ///
    /// Fails if the deployment cannot be reached or does not answer a ping.
    pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Self> {
        let database = booklist_db::connect(settings)
            .await
            .context("failed to connect to the database")?;
        Ok(Self::new(database, settings))
    }

    /// Bind to the book collection of an already connected database.
    pub fn new(database: Database, settings: &DatabaseSettings) -> Self {
        let books = database.collection::<StoredBookDocument>(&settings.collection);
        Self {
            database,
            books,
            timeout: settings.operation_timeout(),
        }
    }

    /// The database handle shared with the `db` module.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Run `future` within the operation timeout, mapping driver errors.
    async fn bounded<F, T>(&self, operation: Operation, future: F) -> Result<T, BookStoreError>
    where
        F: IntoFuture<Output = mongodb::error::Result<T>>,
    {
        tokio::time::timeout(self.timeout, future.into_future())
            .await
            .map_err(|_| BookStoreError::Timeout { operation })?
            .map_err(|source| BookStoreError::Database { operation, source })
    }

    async fn find_by_id(&self, id: &str) -> Result<BookListing, BookStoreError> {
        let object_id = parse_book_id(id)?;
        let document = self
            .bounded(
                Operation::GetBook,
                self.books.find_one(doc! { "_id": object_id }),
            )
            .await?;

        document
            .map(BookListing::from)
            .ok_or_else(|| BookStoreError::NotFound { id: id.to_string() })
    }

    async fn find_all(&self) -> Result<Vec<BookListing>, BookStoreError> {
        self.collect_matching(Operation::GetBooks, doc! {}).await
    }

    async fn find_by_author(&self, author: &str) -> Result<Vec<BookListing>, BookStoreError> {
        self.collect_matching(Operation::GetBooksByAuthor, doc! { "author": author })
            .await
    }

    /// Query and drain the cursor within a single timeout.
    async fn collect_matching(
        &self,
        operation: Operation,
        filter: Document,
    ) -> Result<Vec<BookListing>, BookStoreError> {
        let books = &self.books;
        let drain = async move {
            // Cursor is killed on drop.
            let mut cursor = books.find(filter).await?;
            let mut listings = Vec::new();
            while let Some(document) = cursor.try_next().await? {
                listings.push(BookListing::from(document));
            }
            Ok::<_, mongodb::error::Error>(listings)
        };
        self.bounded(operation, drain).await
    }

    async fn insert(&self, input: CreateBookListing) -> Result<BookListing, BookStoreError> {
        let now = unix_timestamp_now();
        let document = NewBookDocument::new(input, now);
        let inserts = self.books.clone_with_type::<NewBookDocument>();

        let inserted = self
            .bounded(Operation::CreateBook, inserts.insert_one(&document))
            .await?;

        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or(BookStoreError::MissingInsertedId)?;
        Ok(document.into_listing(id))
    }

    async fn find_and_update(
        &self,
        id: &str,
        input: UpdateBookListing,
    ) -> Result<BookListing, BookStoreError> {
        let object_id = parse_book_id(id)?;
        let now = unix_timestamp_now();

        let updated = self
            .bounded(
                Operation::UpdateBook,
                self.books
                    .find_one_and_update(doc! { "_id": object_id }, input.to_set_document(now))
                    .return_document(ReturnDocument::After),
            )
            .await?;

        updated
            .map(BookListing::from)
            .ok_or_else(|| BookStoreError::NotFound { id: id.to_string() })
    }

    async fn delete_one(&self, id: &str) -> Result<DeleteConfirmation, BookStoreError> {
        let object_id = parse_book_id(id)?;
        let deleted = self
            .bounded(
                Operation::DeleteBook,
                self.books.delete_one(doc! { "_id": object_id }),
            )
            .await?;

        Ok(DeleteConfirmation {
            deleted_book_id: id.to_string(),
            deleted_count: deleted.deleted_count,
        })
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn get_by_id(&self, id: &str) -> Result<BookListing, BookStoreError> {
        record(Operation::GetBook, Some(id), self.find_by_id(id).await)
    }

    async fn get_all(&self) -> Result<Vec<BookListing>, BookStoreError> {
        record(Operation::GetBooks, None, self.find_all().await)
    }

    async fn get_by_author(&self, author: &str) -> Result<Vec<BookListing>, BookStoreError> {
        record(
            Operation::GetBooksByAuthor,
            None,
            self.find_by_author(author).await,
        )
    }

    async fn create(&self, input: CreateBookListing) -> Result<BookListing, BookStoreError> {
        let result = self.insert(input).await;
        let id = result.as_ref().ok().map(|listing| listing.id.clone());
        record(Operation::CreateBook, id.as_deref(), result)
    }

    async fn update(
        &self,
        id: &str,
        input: UpdateBookListing,
    ) -> Result<BookListing, BookStoreError> {
        record(
            Operation::UpdateBook,
            Some(id),
            self.find_and_update(id, input).await,
        )
    }

    async fn delete_by_id(&self, id: &str) -> Result<DeleteConfirmation, BookStoreError> {
        record(Operation::DeleteBook, Some(id), self.delete_one(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::Client;

    /// Store behind a non-routable address; every round trip stalls until the operation timeout.
    async fn unreachable_store() -> MongoBookStore {
        let settings = DatabaseSettings {
            uri: "mongodb://10.255.255.1:27017/?serverSelectionTimeoutMS=60000".to_string(),
            operation_timeout_secs: 1,
            ..DatabaseSettings::default()
        };
        let client = Client::with_uri_str(&settings.uri).await.unwrap();
        MongoBookStore::new(client.database(&settings.name), &settings)
    }

    #[tokio::test]
    async fn stalled_lookup_times_out() {
        let store = unreachable_store().await;
        let started = tokio::time::Instant::now();

        let err = store
            .get_by_id("65f1c0ffee0000000000beef")
            .await
            .unwrap_err();
        assert!(
            matches!(err, BookStoreError::Timeout { operation: Operation::GetBook }),
            "{err:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn stalled_listing_times_out() {
        let store = unreachable_store().await;

        let err = store.get_all().await.unwrap_err();
        assert!(
            matches!(err, BookStoreError::Timeout { operation: Operation::GetBooks }),
            "{err:?}"
        );

        // A failed call leaves the store usable for the next one.
        let err = store.get_by_author("Herbert").await.unwrap_err();
        assert!(
            matches!(err, BookStoreError::Timeout { operation: Operation::GetBooksByAuthor }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn malformed_id_fails_before_any_round_trip() {
        let store = unreachable_store().await;
        let started = tokio::time::Instant::now();

        let err = store.delete_by_id("nothex").await.unwrap_err();
        assert!(matches!(err, BookStoreError::InvalidId { .. }), "{err:?}");
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
