//! Resource handlers: list, read, has-many, create, update.

use crate::config::{Collection, FieldType};
use crate::error::AppError;
use crate::filter::FilterDescriptor;
use crate::response::{created, ok};
use crate::service::{ResourceAdapter, ResourcePayload};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Path id typed by the identifier field; malformed numbers and uuids are rejected.
fn parse_id(id_str: &str, collection: &Collection) -> Result<Value, AppError> {
    let field_type = collection.identifier_field().map(|f| f.field_type);
    Ok(match field_type {
        Some(FieldType::Uuid) => {
            let u = uuid::Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest("invalid uuid".into()))?;
            Value::String(u.to_string())
        }
        Some(FieldType::Number) => {
            let n: i64 = id_str.parse().map_err(|_| AppError::BadRequest("invalid id".into()))?;
            Value::Number(n.into())
        }
        _ => Value::String(id_str.to_string()),
    })
}

fn adapter<'a>(state: &'a AppState, collection: &str) -> Result<ResourceAdapter<'a>, AppError> {
    ResourceAdapter::new(&state.registry, state.store.as_ref(), collection)
}

pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = adapter(&state, &collection)?;
    let filter = FilterDescriptor::from_query(&params);
    let list = adapter.list_resources(&filter).await?;
    Ok(ok(state.encoder.encode_many(&list.type_name, &list.resources, list.count)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = adapter(&state, &collection)?;
    let id = parse_id(&id, adapter.collection())?;
    let resource = adapter
        .get_resource(&id)
        .await?
        .ok_or_else(|| AppError::ObjectNotFound(format!("{} {}", collection, crate::resource::id_string(&id))))?;
    Ok(ok(state.encoder.encode_one(Some(&resource))))
}

pub async fn has_many(
    State(state): State<AppState>,
    Path((collection, id, association)): Path<(String, String, String)>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = adapter(&state, &collection)?;
    let id = parse_id(&id, adapter.collection())?;
    let filter = FilterDescriptor::from_query(&params);
    let list = adapter.get_has_many(&id, &association, &filter).await?;
    Ok(ok(state.encoder.encode_many(&list.type_name, &list.resources, list.count)))
}

pub async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = adapter(&state, &collection)?;
    let payload = ResourcePayload::parse(body)?;
    let id = adapter.create_resource(&payload).await?;
    let resource = adapter.get_resource(&id).await?;
    Ok(created(state.encoder.encode_one(resource.as_ref())))
}

pub async fn update(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = adapter(&state, &collection)?;
    let id = parse_id(&id, adapter.collection())?;
    let payload = ResourcePayload::parse(body)?;
    let id = adapter.update_resource(&id, &payload).await?;
    let resource = adapter.get_resource(&id).await?;
    Ok(ok(state.encoder.encode_one(resource.as_ref())))
}
