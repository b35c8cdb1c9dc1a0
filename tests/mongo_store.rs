//! Store behaviour against a live MongoDB.
//!
//! Run with `BOOKLIST_TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`.

use booklist_app::books::models::{CreateBookListing, UpdateBookListing};
use booklist_app::books::store::{BookStore, BookStoreError, MongoBookStore};
use booklist_kernel::settings::DatabaseSettings;
use mongodb::bson::oid::ObjectId;

async fn store() -> (MongoBookStore, String) {
    let uri = std::env::var("BOOKLIST_TEST_MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let collection = format!("booklist_{}", ObjectId::new().to_hex());
    let settings = DatabaseSettings {
        uri,
        name: "book_test".to_string(),
        collection: collection.clone(),
        operation_timeout_secs: 5,
    };
    (MongoBookStore::connect(&settings).await.unwrap(), collection)
}

async fn drop_collection(store: &MongoBookStore, name: &str) {
    store
        .database()
        .collection::<mongodb::bson::Document>(name)
        .drop()
        .await
        .unwrap();
}

fn listing(title: &str, author: &str) -> CreateBookListing {
    CreateBookListing {
        title: title.to_string(),
        description: format!("{title} description"),
        author: author.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn dune_lifecycle() {
    let (store, collection) = store().await;

    let created = store
        .create(CreateBookListing {
            title: "Dune".to_string(),
            description: "Desert planet epic".to_string(),
            author: "Herbert".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(created.id.len(), 24);
    assert!(ObjectId::parse_str(&created.id).is_ok());

    let fetched = store.get_by_id(&created.id).await.unwrap();
    assert_eq!(fetched, created);

    let by_author = store.get_by_author("Herbert").await.unwrap();
    assert_eq!(by_author, vec![created.clone()]);

    let updated = store
        .update(
            &created.id,
            UpdateBookListing {
                author: Some("F. Herbert".to_string()),
                ..UpdateBookListing::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Dune");
    assert_eq!(updated.description, "Desert planet epic");
    assert_eq!(updated.author, "F. Herbert");
    assert!(updated.added_on >= created.added_on);

    assert!(store.get_by_author("Herbert").await.unwrap().is_empty());
    assert_eq!(store.get_by_author("F. Herbert").await.unwrap(), vec![updated]);

    let confirmation = store.delete_by_id(&created.id).await.unwrap();
    assert_eq!(confirmation.deleted_book_id, created.id);
    assert_eq!(confirmation.deleted_count, 1);

    let err = store.get_by_id(&created.id).await.unwrap_err();
    assert!(matches!(err, BookStoreError::NotFound { .. }));

    let again = store.delete_by_id(&created.id).await.unwrap();
    assert_eq!(again.deleted_count, 0);

    drop_collection(&store, &collection).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn get_all_and_exact_author_match() {
    let (store, collection) = store().await;

    let a = store.create(listing("A", "Le Guin")).await.unwrap();
    let b = store.create(listing("B", "le guin")).await.unwrap();
    let c = store.create(listing("C", "Le Guin")).await.unwrap();

    let all: Vec<_> = store
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|book| book.id)
        .collect();
    assert_eq!(all.len(), 3);
    for id in [&a.id, &b.id, &c.id] {
        assert!(all.contains(id));
    }

    let mut exact: Vec<_> = store
        .get_by_author("Le Guin")
        .await
        .unwrap()
        .into_iter()
        .map(|book| book.id)
        .collect();
    exact.sort();
    let mut expected = vec![a.id.clone(), c.id.clone()];
    expected.sort();
    assert_eq!(exact, expected);

    drop_collection(&store, &collection).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn missing_and_malformed_ids() {
    let (store, collection) = store().await;
    let missing = ObjectId::new().to_hex();

    assert!(matches!(
        store.get_by_id(&missing).await,
        Err(BookStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.update(&missing, UpdateBookListing::default()).await,
        Err(BookStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.get_by_id("not-hex").await,
        Err(BookStoreError::InvalidId { .. })
    ));
    assert!(matches!(
        store.delete_by_id("not-hex").await,
        Err(BookStoreError::InvalidId { .. })
    ));

    drop_collection(&store, &collection).await;
}
