pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use booklist_kernel::{InitCtx, Module};
use serde_json::json;

use routes::SharedBookStore;

/// Books module: CRUD over the book listing collection
pub struct BooksModule {
    store: SharedBookStore,
}

impl BooksModule {
    pub fn new(store: SharedBookStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            collection = %ctx.settings.database.collection,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn id_parameter() -> serde_json::Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Hex encoded book id",
        "schema": { "type": "string" }
    })
}

fn collection_path() -> serde_json::Value {
    let book_list = json!({ "type": "array", "items": { "$ref": "#/components/schemas/BookListing" } });
    let create_responses = json!({
        "201": json_response("Created book", json!({ "$ref": "#/components/schemas/BookListing" })),
        "400": error_response("Malformed body"),
        "415": error_response("Body is not sent as application/json"),
        "422": error_response("Validation error"),
        "500": error_response("Internal server error")
    });

    json!({
        "get": {
            "summary": "List books, optionally filtered by exact author name",
            "tags": ["Books"],
            "parameters": [{
                "name": "author",
                "in": "query",
                "required": false,
                "schema": { "type": "string" }
            }],
            "responses": {
                "200": json_response("List of books", book_list),
                "500": error_response("Internal server error")
            }
        },
        "post": {
            "summary": "Create a book listing",
            "tags": ["Books"],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/CreateBookListing" }
                    }
                }
            },
            "responses": create_responses
        }
    })
}

fn item_path() -> serde_json::Value {
    let book_ref = json!({ "$ref": "#/components/schemas/BookListing" });
    let update_responses = json!({
        "200": json_response("Book after the update", book_ref.clone()),
        "400": error_response("Malformed body"),
        "404": error_response("Book not found"),
        "415": error_response("Body is not sent as application/json"),
        "422": error_response("Malformed id or body"),
        "500": error_response("Internal server error")
    });

    json!({
        "get": {
            "summary": "Get a book by id",
            "tags": ["Books"],
            "parameters": [id_parameter()],
            "responses": {
                "200": json_response("Book", book_ref),
                "404": error_response("Book not found"),
                "422": error_response("Malformed id"),
                "500": error_response("Internal server error")
            }
        },
        "patch": {
            "summary": "Partially update a book; addedOn is always refreshed",
            "tags": ["Books"],
            "parameters": [id_parameter()],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/UpdateBookListing" }
                    }
                }
            },
            "responses": update_responses
        },
        "delete": {
            "summary": "Delete a book by id",
            "tags": ["Books"],
            "parameters": [id_parameter()],
            "responses": {
                "200": json_response(
                    "Delete confirmation",
                    json!({ "$ref": "#/components/schemas/DeleteConfirmation" })
                ),
                "422": error_response("Malformed id"),
                "500": error_response("Internal server error")
            }
        }
    })
}

fn schemas() -> serde_json::Value {
    let text_fields = json!({
        "title": { "type": "string" },
        "description": { "type": "string" },
        "author": { "type": "string" }
    });

    json!({
        "BookListing": {
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Hex encoded book id" },
                "title": { "type": "string" },
                "description": { "type": "string" },
                "author": { "type": "string" },
                "addedOn": {
                    "type": "number",
                    "description": "Unix timestamp (seconds) of the last write"
                }
            },
            "required": ["id", "title", "description", "author", "addedOn"]
        },
        "CreateBookListing": {
            "type": "object",
            "properties": text_fields.clone(),
            "required": ["title", "description", "author"]
        },
        "UpdateBookListing": {
            "type": "object",
            "properties": text_fields
        },
        "DeleteConfirmation": {
            "type": "object",
            "properties": {
                "deletedBookId": { "type": "string" },
                "deletedCount": { "type": "integer", "minimum": 0 }
            },
            "required": ["deletedBookId", "deletedCount"]
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/": collection_path(),
            "/{id}": item_path(),
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": {
                                "text/plain": { "schema": { "type": "string" } }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": schemas()
        }
    })
}

/// Create a new instance of the books module
pub fn create_module(store: SharedBookStore) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::store::InMemoryBookStore;

    #[test]
    fn openapi_describes_every_route() {
        let module = BooksModule::new(Arc::new(InMemoryBookStore::new()));
        let spec = module.openapi().unwrap();

        for method in ["get", "post"] {
            assert!(spec["paths"]["/"][method].is_object(), "{method} /");
        }
        for method in ["get", "patch", "delete"] {
            assert!(spec["paths"]["/{id}"][method].is_object(), "{method} /{{id}}");
        }
        assert!(spec["paths"]["/"]["post"]["responses"]["415"].is_object());
        assert!(spec["paths"]["/{id}"]["patch"]["responses"]["415"].is_object());
        assert_eq!(
            spec["components"]["schemas"]["BookListing"]["required"],
            json!(["id", "title", "description", "author", "addedOn"])
        );
    }

    #[test]
    fn module_is_named_books() {
        let module = create_module(Arc::new(InMemoryBookStore::new()));
        assert_eq!(module.name(), "books");
    }
}
