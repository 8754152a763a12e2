//! Routers: common endpoints plus JSON:API resources, with request tracing.

pub mod common;
pub mod resource;

pub use common::common_routes;
pub use resource::resource_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Full application router. Static routes win over the `/:collection` segment.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state))
        .layer(TraceLayer::new_for_http())
}
