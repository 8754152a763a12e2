//! Common routes: health, readiness, version, collection map.

use crate::response::Document;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    store: &'static str,
    collections: usize,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    let collections = state.registry.collections().len();
    if let Err(e) = state.store.ping().await {
        tracing::warn!(error = %e, "store not ready");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                store: "unavailable",
                collections,
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        store: "ok",
        collections,
    }))
}

async fn apimap(State(state): State<AppState>) -> Json<Document> {
    Json(state.encoder.encode_collections(&state.registry))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, GET /ready, GET /version, GET /apimap.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/apimap", get(apimap))
        .with_state(state)
}
