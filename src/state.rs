//! Shared application state for all routes. The registry is read-only after startup.

use crate::config::SchemaRegistry;
use crate::response::Encoder;
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub store: Arc<dyn Store>,
    pub encoder: Encoder,
}

impl AppState {
    pub fn new(registry: SchemaRegistry, store: Arc<dyn Store>, link_prefix: &str) -> Self {
        AppState {
            registry: Arc::new(registry),
            store,
            encoder: Encoder::new(link_prefix),
        }
    }
}
