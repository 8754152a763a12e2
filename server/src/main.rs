//! JSON:API server over PostgreSQL.
//!
//! Run from repo root: `cargo run -p jsonapi-server`
//! Reads DATABASE_URL, SCHEMA_PATH, LINK_PREFIX, BIND_ADDR and DB_SCHEMA (see `.env`).

use jsonapi_adapter::{app, load_from_path, resolve, AppState, PgStore, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jsonapi_adapter=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env();
    let config = load_from_path(&settings.schema_path)
        .await?
        .with_default_schema(settings.db_schema.as_deref());
    let registry = resolve(&config)?;
    tracing::info!(collections = registry.collections().len(), "schema loaded");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    let state = AppState::new(registry, Arc::new(PgStore::new(pool)), &settings.link_prefix);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
