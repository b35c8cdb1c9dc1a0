use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

/// A book listing as exposed to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    /// Hex encoding of the stored ObjectId
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    /// Unix timestamp in seconds of the last write
    pub added_on: f64,
}

/// A book listing as persisted in the `booklist` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBookDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "addedOn")]
    pub added_on: f64,
}

impl From<StoredBookDocument> for BookListing {
    fn from(document: StoredBookDocument) -> Self {
        Self {
            id: document.id.to_hex(),
            title: document.title,
            description: document.description,
            author: document.author,
            added_on: document.added_on,
        }
    }
}

/// Document written on insert; the store assigns `_id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBookDocument {
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "addedOn")]
    pub added_on: f64,
}

impl NewBookDocument {
    pub fn new(input: CreateBookListing, added_on: f64) -> Self {
        Self {
            title: input.title,
            description: input.description,
            author: input.author,
            added_on,
        }
    }

    /// The listing that was requested to be written, under its assigned id.
    pub fn into_listing(self, id: ObjectId) -> BookListing {
        self.into_stored(id).into()
    }

    pub fn into_stored(self, id: ObjectId) -> StoredBookDocument {
        StoredBookDocument {
            id,
            title: self.title,
            description: self.description,
            author: self.author,
            added_on: self.added_on,
        }
    }
}

/// Request model for creating a new book listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookListing {
    pub title: String,
    pub description: String,
    pub author: String,
}

/// Request model for a partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBookListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl UpdateBookListing {
    /// `$set` body holding the present fields plus `addedOn`, which is always written.
    pub fn to_set_document(&self, added_on: f64) -> Document {
        let mut set = Document::new();
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.as_str());
        }
        if let Some(author) = &self.author {
            set.insert("author", author.as_str());
        }
        set.insert("addedOn", added_on);
        doc! { "$set": set }
    }

    /// Same semantics as [`UpdateBookListing::to_set_document`], applied in place.
    pub fn apply_to(&self, document: &mut StoredBookDocument, added_on: f64) {
        if let Some(title) = &self.title {
            document.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            document.description.clone_from(description);
        }
        if let Some(author) = &self.author {
            document.author.clone_from(author);
        }
        document.added_on = added_on;
    }
}

/// Acknowledgement of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConfirmation {
    /// The id exactly as requested
    pub deleted_book_id: String,
    /// Number of documents removed; 0 when nothing matched
    pub deleted_count: u64,
}

/// Query string accepted by the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBooksQuery {
    pub author: Option<String>,
}
