//! Service bootstrap: store construction, module registration, and the HTTP lifecycle.

use std::sync::Arc;

use anyhow::Context;
use booklist_db::DatabaseModule;
use booklist_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{
    self,
    books::store::{BookStore, InMemoryBookStore, MongoBookStore},
};

/// Where book listings are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Mongo,
    /// Process-local store; contents are lost on exit.
    InMemory,
}

/// Construct the store and register every module that depends on it.
///
/// A MongoDB backend that cannot be reached fails here, before anything is served.
pub async fn build_registry(
    settings: &Settings,
    backend: StoreBackend,
) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();

    let store: Arc<dyn BookStore> = match backend {
        StoreBackend::Mongo => {
            let store = MongoBookStore::connect(&settings.database)
                .await
                .context("book store is unavailable")?;
            registry.register_core(Arc::new(DatabaseModule::new(
                store.database().clone(),
                settings.database.operation_timeout(),
            )));
            Arc::new(store)
        }
        StoreBackend::InMemory => {
            tracing::warn!("using the in-memory book store; listings will not be persisted");
            Arc::new(InMemoryBookStore::new())
        }
    };

    modules::register_all(&mut registry, store);
    Ok(registry)
}

/// Run the service until a shutdown signal arrives.
pub async fn serve(settings: Settings, backend: StoreBackend) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.name,
        collection = %settings.database.collection,
        ?backend,
        "booklist bootstrap starting"
    );

    let registry = build_registry(&settings, backend).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.boot(&ctx).await?;
    tracing::info!(
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "booklist bootstrap complete"
    );

    let served = booklist_http::start_server(&registry, &settings).await;

    registry
        .shutdown()
        .await
        .context("failed to stop modules")?;
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn in_memory_registry_serves_books() {
        let settings = Settings::default();
        let registry = build_registry(&settings, StoreBackend::InMemory)
            .await
            .unwrap();

        assert_eq!(registry.core_module_count(), 0);
        assert!(registry.get_module("books").is_some());

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.boot(&ctx).await.unwrap();

        let app = booklist_http::build_router(&registry, &settings);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/books")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"title":"Dune","description":"Desert planet epic","author":"Herbert"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let spec: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(spec["paths"]["/api/books/{id}"]["patch"].is_object());

        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn other_methods_on_books_health_get_error_envelope() {
        let settings = Settings::default();
        let registry = build_registry(&settings, StoreBackend::InMemory)
            .await
            .unwrap();
        let app = booklist_http::build_router(&registry, &settings);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/books/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "method_not_allowed");
    }

    #[tokio::test]
    async fn unreachable_mongo_fails_startup() {
        let mut settings = Settings::default();
        settings.database.uri = "mongodb://127.0.0.1:1/?connectTimeoutMS=200".to_string();
        settings.database.operation_timeout_secs = 1;

        let result = build_registry(&settings, StoreBackend::Mongo).await;
        assert!(result.is_err());
    }
}
