//! MongoDB client factory and the `db` core module.

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use booklist_kernel::{settings::DatabaseSettings, InitCtx, Module};
use mongodb::{
    bson::doc,
    options::{ClientOptions, ReadPreference, SelectionCriteria},
    Client, Database,
};

const APP_NAME: &str = "booklist";

/// Connect to the configured MongoDB deployment and verify it answers a ping.
///
/// Both the handshake and the ping are bounded by the operation timeout. Any
/// failure here is a startup error; callers are expected to abort.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Database> {
    let timeout = settings.operation_timeout();

    let mut options = ClientOptions::parse(settings.uri.as_str())
        .await
        .with_context(|| "failed to parse database uri")?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);

    let client = Client::with_options(options).context("failed to create database client")?;
    let database = client.database(&settings.name);

    ping(&database, timeout)
        .await
        .with_context(|| format!("database '{}' is not reachable", settings.name))?;

    tracing::info!(
        target: "booklist-db",
        database = %settings.name,
        collection = %settings.collection,
        "database connected successfully"
    );
    Ok(database)
}

/// Run a `ping` against the primary, bounded by `timeout`.
pub async fn ping(database: &Database, timeout: Duration) -> anyhow::Result<()> {
    let command = database
        .run_command(doc! { "ping": 1 })
        .selection_criteria(SelectionCriteria::ReadPreference(ReadPreference::Primary));

    tokio::time::timeout(timeout, command.into_future())
        .await
        .with_context(|| format!("ping timed out after {:?}", timeout))?
        .context("ping command failed")?;
    Ok(())
}

/// Core module owning the shared database handle.
pub struct DatabaseModule {
    state: HealthState,
}

#[derive(Clone)]
struct HealthState {
    database: Database,
    timeout: Duration,
}

impl DatabaseModule {
    pub fn new(database: Database, timeout: Duration) -> Self {
        Self {
            state: HealthState { database, timeout },
        }
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            database = %ctx.settings.database.name,
            "db module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/health": {
                    "get": {
                        "summary": "Database health check",
                        "tags": ["Database"],
                        "responses": {
                            "200": {
                                "description": "Database answered a ping",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            },
                            "503": {
                                "description": "Database is unreachable",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

/// Health check endpoint backed by a live ping
async fn health_check(State(state): State<HealthState>) -> (StatusCode, &'static str) {
    match ping(&state.database, state.timeout).await {
        Ok(()) => (StatusCode::OK, "database is healthy"),
        Err(err) => {
            tracing::warn!(target: "booklist-db", error = %format!("{err:#}"), "database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database is unreachable")
        }
    }
}
