//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Problems found while turning a schema document into a registry.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid identifier: collection {collection} has no field '{field}'")]
    InvalidIdentifier { collection: String, field: String },
    #[error("duplicate collection: {0}")]
    DuplicateCollection(String),
    #[error("duplicate relationship: collection {collection} references '{target}' more than once")]
    DuplicateRelationship { collection: String, target: String },
    #[error("schema load: {0}")]
    Load(String),
}

/// Registry lookup miss. Kept as its own type so association errors can carry it as a source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("collection not found: {0}")]
pub struct CollectionNotFound(pub String);

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    CollectionNotFound(#[from] CollectionNotFound),
    #[error("association not found: {name}")]
    AssociationNotFound {
        name: String,
        #[source]
        source: CollectionNotFound,
    },
    #[error("object not found: {0}")]
    ObjectNotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store: {0}")]
    Store(String),
}

impl AppError {
    /// Re-raise a lookup miss with the association name that triggered it.
    pub fn association(name: impl Into<String>, source: CollectionNotFound) -> Self {
        AppError::AssociationNotFound {
            name: name.into(),
            source,
        }
    }

    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Schema(_) => (StatusCode::INTERNAL_SERVER_ERROR, "schema_error"),
            AppError::CollectionNotFound(_) => (StatusCode::NOT_FOUND, "collection_not_found"),
            AppError::AssociationNotFound { .. } => (StatusCode::NOT_FOUND, "association_not_found"),
            AppError::ObjectNotFound(_) => (StatusCode::NOT_FOUND, "object_not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Db(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "object_not_found"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        }
    }
}

/// JSON:API error document: `{ "errors": [ { status, code, detail } ] }`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorObject>,
}

#[derive(Serialize)]
pub struct ErrorObject {
    pub status: String,
    pub code: String,
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            errors: vec![ErrorObject {
                status: status.as_u16().to_string(),
                code: code.to_string(),
                detail: self.to_string(),
            }],
        };
        (status, Json(body)).into_response()
    }
}
