use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{parse_book_id, record, BookStore, BookStoreError, Operation};
use crate::modules::books::models::{
    BookListing, CreateBookListing, DeleteConfirmation, NewBookDocument, StoredBookDocument,
    UpdateBookListing,
};
use crate::utils::unix_timestamp_now;

/// [`BookStore`] keeping listings in process, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<StoredBookDocument>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_by_id(&self, id: &str) -> Result<BookListing, BookStoreError> {
        let object_id = parse_book_id(id)?;
        let books = self.books.read().await;
        books
            .iter()
            .find(|book| book.id == object_id)
            .cloned()
            .map(BookListing::from)
            .ok_or_else(|| BookStoreError::NotFound { id: id.to_string() })
    }

    async fn collect_matching<P>(&self, predicate: P) -> Vec<BookListing>
    where
        P: Fn(&StoredBookDocument) -> bool,
    {
        let books = self.books.read().await;
        books
            .iter()
            .filter(|book| predicate(book))
            .cloned()
            .map(BookListing::from)
            .collect()
    }

    async fn insert(&self, input: CreateBookListing) -> BookListing {
        let document = NewBookDocument::new(input, unix_timestamp_now());
        let stored = document.into_stored(ObjectId::new());
        self.books.write().await.push(stored.clone());
        stored.into()
    }

    async fn find_and_update(
        &self,
        id: &str,
        input: UpdateBookListing,
    ) -> Result<BookListing, BookStoreError> {
        let object_id = parse_book_id(id)?;
        let now = unix_timestamp_now();

        let mut books = self.books.write().await;
        let book = books
            .iter_mut()
            .find(|book| book.id == object_id)
            .ok_or_else(|| BookStoreError::NotFound { id: id.to_string() })?;
        input.apply_to(book, now);
        Ok(book.clone().into())
    }

    async fn delete_one(&self, id: &str) -> Result<DeleteConfirmation, BookStoreError> {
        let object_id = parse_book_id(id)?;

        let mut books = self.books.write().await;
        let deleted_count = match books.iter().position(|book| book.id == object_id) {
            Some(index) => {
                books.remove(index);
                1
            }
            None => 0,
        };

        Ok(DeleteConfirmation {
            deleted_book_id: id.to_string(),
            deleted_count,
        })
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn get_by_id(&self, id: &str) -> Result<BookListing, BookStoreError> {
        record(Operation::GetBook, Some(id), self.find_by_id(id).await)
    }

    async fn get_all(&self) -> Result<Vec<BookListing>, BookStoreError> {
        let books = self.collect_matching(|_| true).await;
        record(Operation::GetBooks, None, Ok(books))
    }

    async fn get_by_author(&self, author: &str) -> Result<Vec<BookListing>, BookStoreError> {
        let books = self.collect_matching(|book| book.author == author).await;
        record(Operation::GetBooksByAuthor, None, Ok(books))
    }

    async fn create(&self, input: CreateBookListing) -> Result<BookListing, BookStoreError> {
        let listing = self.insert(input).await;
        let id = listing.id.clone();
        record(Operation::CreateBook, Some(&id), Ok(listing))
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
    use crate::modules::books::store::contract;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        contract::create_then_get_round_trips(&InMemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        contract::update_changes_only_given_fields(&InMemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        contract::delete_then_get_is_not_found(&InMemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn author_filter_is_exact() {
        contract::author_filter_is_exact(&InMemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn missing_and_malformed_ids() {
        contract::missing_and_malformed_ids(&InMemoryBookStore::new()).await;
    }

    #[tokio::test]
    async fn get_all_keeps_insertion_order() {
        let store = InMemoryBookStore::new();
        let first = store.create(contract::dune()).await.unwrap();
        let second = store.create(contract::dune()).await.unwrap();

        let ids: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|book| book.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let store = InMemoryBookStore::new();
        assert!(store.get_all().await.unwrap().is_empty());
        assert!(store.get_by_author("Herbert").await.unwrap().is_empty());
    }
}
