//! JSON:API adapter: schema-driven resources over a relational store.

pub mod case;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod resource;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{load_from_path, resolve, Collection, SchemaConfig, SchemaRegistry};
pub use error::{AppError, CollectionNotFound, SchemaError};
pub use filter::FilterDescriptor;
pub use resource::Resource;
pub use response::{Document, Encoder};
pub use settings::Settings;
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};
pub use routes::{app, common_routes, resource_routes};
pub use service::{ResourceAdapter, ResourceList, ResourcePayload};
