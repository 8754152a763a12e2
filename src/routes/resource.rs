//! JSON:API resource routes. The collection is a path segment resolved by the handlers.

use crate::handlers::{create, has_many, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/:collection", get(list).post(create))
        .route("/:collection/:id", get(read).put(update))
        .route("/:collection/:id/relationships/:association", get(has_many))
        .with_state(state)
}
