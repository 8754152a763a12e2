//! Resource operations for one collection: read, list, has-many, create, update.

use crate::case::type_to_collection;
use crate::config::{Collection, Field, RelationKind, RelationshipSpec, SchemaRegistry};
use crate::error::{AppError, CollectionNotFound};
use crate::filter::FilterDescriptor;
use crate::resource::{id_string, Resource};
use crate::service::assembler::ResourceAssembler;
use crate::service::coerce::coerce;
use crate::service::relationships::RelationshipResolver;
use crate::service::translate::{typed_id, QueryTranslator, TranslatedQuery};
use crate::sql::{CompareOp, Param, Predicate};
use crate::store::{Row, Store, TableRef};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Write payload: `{ "data": { "attributes": {...}, "relationships": { name: { "data": { type, id } } } } }`.
#[derive(Debug, Deserialize)]
pub struct ResourcePayload {
    pub data: PayloadData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PayloadData {
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipPayload>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipPayload {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct Linkage {
    #[serde(rename = "type")]
    type_: String,
    id: Value,
}

impl RelationshipPayload {
    /// To-one linkage; null and array data yield `None`.
    fn linkage(&self) -> Option<Linkage> {
        match &self.data {
            Value::Object(_) => serde_json::from_value(self.data.clone()).ok(),
            _ => None,
        }
    }
}

impl ResourcePayload {
    pub fn parse(value: Value) -> Result<Self, AppError> {
        serde_json::from_value(value).map_err(|e| AppError::BadRequest(format!("invalid payload: {}", e)))
    }
}

/// A page of resources plus the unpaginated total.
#[derive(Debug)]
pub struct ResourceList {
    pub type_name: String,
    pub resources: Vec<Resource>,
    pub count: u64,
}

pub struct ResourceAdapter<'a> {
    registry: &'a SchemaRegistry,
    store: &'a dyn Store,
    collection: Arc<Collection>,
}

impl<'a> ResourceAdapter<'a> {
    /// Fails with `CollectionNotFound` when `collection` is not in the registry.
    pub fn new(registry: &'a SchemaRegistry, store: &'a dyn Store, collection: &str) -> Result<Self, AppError> {
        let collection = registry.find_collection(collection)?;
        Ok(ResourceAdapter {
            registry,
            store,
            collection,
        })
    }

    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    fn assembler(&self) -> ResourceAssembler<'a> {
        ResourceAssembler::new(self.store)
    }

    fn resolver(&self) -> RelationshipResolver<'a> {
        RelationshipResolver::new(self.registry, self.assembler())
    }

    /// `None` when no row has this id.
    pub async fn get_resource(&self, id: &Value) -> Result<Option<Resource>, AppError> {
        tracing::debug!(collection = %self.collection.name, id = %id_string(id), "get resource");
        let Some(mut loaded) = self.assembler().load(id, &self.collection).await? else {
            return Ok(None);
        };
        self.resolver().resolve(&mut loaded.resource, &loaded.row).await?;
        Ok(Some(loaded.resource))
    }

    pub async fn list_resources(&self, filter: &FilterDescriptor) -> Result<ResourceList, AppError> {
        tracing::debug!(collection = %self.collection.name, ?filter, "list resources");
        let query = QueryTranslator::build(&self.collection, filter);
        self.load_list(&self.collection, &query).await
    }

    /// Rows of the associated collection whose inverse key points at `id`.
    pub async fn get_has_many(
        &self,
        id: &Value,
        association: &str,
        filter: &FilterDescriptor,
    ) -> Result<ResourceList, AppError> {
        tracing::debug!(collection = %self.collection.name, id = %id_string(id), association, "get has many");
        let spec = self.find_association(association)?;
        let target = self
            .registry
            .find_collection(&spec.target)
            .map_err(|e| AppError::association(association, e))?;
        let RelationKind::ToMany {
            inverse_key: Some(inverse_key),
        } = &spec.kind
        else {
            return Err(AppError::BadRequest(format!(
                "{} is not a to-many association with a known key",
                association
            )));
        };

        let parent = self.collection.identifier_field();
        let param = match parent {
            Some(f) => Param::with_cast(typed_id(f.field_type, id), f.field_type.sql_cast()),
            None => Param::new(id.clone()),
        };
        let base = QueryTranslator::base(&target).filter(Predicate::Compare {
            column: inverse_key.clone(),
            op: CompareOp::Eq,
            param,
        });
        let query = QueryTranslator::build_from(base, &target, filter);
        self.load_list(&target, &query).await
    }

    /// Insert from a payload; returns the stored identifier.
    pub async fn create_resource(&self, payload: &ResourcePayload) -> Result<Value, AppError> {
        tracing::debug!(collection = %self.collection.name, "create resource");
        let attributes = self.attributes_and_relations(&payload.data)?;
        let mut values = Row::new();
        for (name, raw) in attributes {
            let field = self
                .collection
                .field(&name)
                .ok_or_else(|| AppError::Validation(format!("unknown attribute: {}", name)))?;
            if field.is_to_many() {
                tracing::debug!(collection = %self.collection.name, field = %name, "ignoring to-many attribute");
                continue;
            }
            let value = self.field_value(field, raw, true).await?;
            values.insert(field.column().to_string(), value);
        }

        let row = self.store.insert(&table_ref(&self.collection), &values).await?;
        Ok(row.get(&self.collection.identifier).cloned().unwrap_or(Value::Null))
    }

    /// Update declared, stored attributes of an existing row; returns `id` unchanged.
    pub async fn update_resource(&self, id: &Value, payload: &ResourcePayload) -> Result<Value, AppError> {
        tracing::debug!(collection = %self.collection.name, id = %id_string(id), "update resource");
        let not_found = || AppError::ObjectNotFound(format!("{} {}", self.collection.name, id_string(id)));
        if self.assembler().load_row(id, &self.collection).await?.is_none() {
            return Err(not_found());
        }

        let table = table_ref(&self.collection);
        let columns = self.store.columns(&table).await?;
        let attributes = self.attributes_and_relations(&payload.data)?;
        let mut values = Row::new();
        for (name, raw) in attributes {
            let Some(field) = self.collection.field(&name).filter(|f| !f.is_to_many()) else {
                tracing::debug!(collection = %self.collection.name, field = %name, "ignoring undeclared attribute");
                continue;
            };
            if !columns.contains(field.column()) {
                tracing::debug!(collection = %self.collection.name, column = %field.column(), "ignoring attribute without column");
                continue;
            }
            let value = self.field_value(field, raw, false).await?;
            values.insert(field.column().to_string(), value);
        }

        let key = match self.collection.identifier_field() {
            Some(f) => typed_id(f.field_type, id),
            None => id.clone(),
        };
        self.store.update(&table, &key, &values).await?.ok_or_else(not_found)?;
        Ok(id.clone())
    }

    async fn load_list(&self, collection: &Arc<Collection>, query: &TranslatedQuery) -> Result<ResourceList, AppError> {
        let assembler = self.assembler();
        let resolver = self.resolver();
        let loaded = assembler.load_many(&query.select, collection).await?;
        let count = assembler.count(&query.count).await?;
        let mut resources = Vec::with_capacity(loaded.len());
        for mut l in loaded {
            resolver.resolve(&mut l.resource, &l.row).await?;
            resources.push(l.resource);
        }
        Ok(ResourceList {
            type_name: collection.name.clone(),
            resources,
            count,
        })
    }

    /// By relationship key (target collection name) or by the declaring field's name.
    fn find_association(&self, name: &str) -> Result<&RelationshipSpec, AppError> {
        let key = type_to_collection(name);
        self.collection
            .relationship(&key)
            .or_else(|| self.collection.relationships.values().find(|s| s.field == name))
            .ok_or_else(|| AppError::association(name, CollectionNotFound(key)))
    }

    /// Attributes with to-one relationship linkages folded in under their field names.
    fn attributes_and_relations(&self, data: &PayloadData) -> Result<Map<String, Value>, AppError> {
        let mut attributes = data.attributes.clone();
        for (name, rel) in &data.relationships {
            let Some(linkage) = rel.linkage() else {
                continue;
            };
            let target = type_to_collection(&linkage.type_);
            let spec = self
                .collection
                .relationship(&target)
                .ok_or_else(|| AppError::association(name.clone(), CollectionNotFound(target.clone())))?;
            attributes.insert(spec.field.clone(), linkage.id);
        }
        Ok(attributes)
    }

    /// Reference fields take the raw key (checked against the target when `check` is set); others are coerced.
    async fn field_value(&self, field: &Field, raw: Value, check: bool) -> Result<Value, AppError> {
        let target = self
            .registry
            .find_related_collection(field)
            .map_err(|e| AppError::association(field.name.clone(), e))?;
        let Some(target) = target else {
            return coerce(&field.name, field.field_type, raw);
        };
        if raw.is_null() {
            return Ok(raw);
        }
        let key = match target.identifier_field() {
            Some(f) => typed_id(f.field_type, &raw),
            None => raw,
        };
        if check && self.assembler().load_row(&key, &target).await?.is_none() {
            return Err(AppError::ObjectNotFound(format!("{} {}", target.name, id_string(&key))));
        }
        Ok(key)
    }
}

/// Storage location of a collection with the casts its typed columns need.
pub fn table_ref(collection: &Collection) -> TableRef {
    let stored = || collection.fields.iter().filter(|f| !f.is_to_many());
    TableRef {
        schema: collection.schema.clone(),
        table: collection.table.clone(),
        key: collection.identifier.clone(),
        casts: stored()
            .filter_map(|f| f.field_type.sql_cast().map(|c| (f.column().to_string(), c)))
            .collect(),
        literals: stored()
            .filter(|f| f.field_type.is_enum())
            .map(|f| f.column().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_requires_data_object() {
        assert!(matches!(ResourcePayload::parse(json!({})), Err(AppError::BadRequest(_))));
        assert!(matches!(
            ResourcePayload::parse(json!({ "data": { "attributes": [1] } })),
            Err(AppError::BadRequest(_))
        ));
        let p = ResourcePayload::parse(json!({
            "data": {
                "attributes": { "title": "A" },
                "relationships": {
                    "author": { "data": { "type": "people", "id": "5" } },
                    "tags": { "data": [] },
                    "editor": { "data": null }
                }
            }
        }))
        .unwrap();
        assert_eq!(p.data.attributes["title"], json!("A"));
        let author = p.data.relationships["author"].linkage().unwrap();
        assert_eq!(author.type_, "people");
        assert!(p.data.relationships["tags"].linkage().is_none());
        assert!(p.data.relationships["editor"].linkage().is_none());
    }

    #[test]
    fn table_ref_writes_enums_as_literals_and_json_with_a_cast() {
        let config: crate::config::SchemaConfig = serde_json::from_value(json!({
            "collections": [{
                "name": "posts",
                "fields": [
                    { "field": "id", "type": "Uuid" },
                    { "field": "status", "type": "Enum" },
                    { "field": "meta", "type": "Json" },
                    { "field": "title", "type": "String" }
                ]
            }]
        }))
        .unwrap();
        let posts = crate::config::resolve(&config).unwrap().find_collection("posts").unwrap();
        let table = table_ref(&posts);
        assert_eq!(table.param("status", &json!("draft")), Param::literal(json!("draft")));
        assert_eq!(table.param("meta", &json!({})).cast, Some("jsonb"));
        assert_eq!(table.param("id", &json!("x")).cast, Some("uuid"));
        assert_eq!(table.param("title", &json!("A")), Param::new(json!("A")));
    }
}
