//! Materialized resources and their per-request relationships.

use crate::config::{Collection, RelationKind};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One association link of a loaded resource. Built fresh per resource.
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    /// Target collection name (the JSON:API type of the related resource).
    pub target_type: String,
    pub target_identifier: String,
    /// Field on the owning collection declaring the association.
    pub field_name: String,
    pub kind: RelationKind,
    /// Foreign key read from the loaded row; to-one only.
    pub id: Option<Value>,
}

impl Relationship {
    pub fn is_to_one(&self) -> bool {
        matches!(self.kind, RelationKind::ToOne { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Resource {
    pub collection: Arc<Collection>,
    type_name: String,
    pub id: Value,
    pub attributes: Map<String, Value>,
    pub relationships: Vec<Relationship>,
    pub included: Vec<Resource>,
}

impl Resource {
    /// `id` is taken from the identifier field; `id` and `type` keys never remain in attributes.
    pub fn new(collection: Arc<Collection>, mut attributes: Map<String, Value>) -> Self {
        let id = attributes.get(&collection.identifier).cloned().unwrap_or(Value::Null);
        attributes.remove("id");
        attributes.remove("type");
        Resource {
            type_name: collection.name.clone(),
            collection,
            id,
            attributes,
            relationships: Vec::new(),
            included: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set_type(&mut self, type_name: impl Into<String>) {
        self.type_name = type_name.into();
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn include(&mut self, resource: Resource) {
        self.included.push(resource);
    }
}

/// JSON:API ids are strings.
pub fn id_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Field, FieldType};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn tags(identifier: &str) -> Arc<Collection> {
        Arc::new(Collection {
            name: "tags".into(),
            table: "tags".into(),
            schema: None,
            identifier: identifier.into(),
            fields: vec![Field::scalar(identifier, FieldType::String)],
            relationships: BTreeMap::new(),
        })
    }

    #[test]
    fn id_comes_from_identifier_and_is_stripped() {
        let attrs = json!({ "id": 3, "type": "x", "label": "rust" });
        let r = Resource::new(tags("id"), attrs.as_object().unwrap().clone());
        assert_eq!(r.id, json!(3));
        assert_eq!(r.type_name(), "tags");
        assert!(!r.attributes.contains_key("id"));
        assert!(!r.attributes.contains_key("type"));
        assert_eq!(r.attributes["label"], json!("rust"));
    }

    #[test]
    fn custom_identifier_stays_as_attribute() {
        let attrs = json!({ "slug": "rust", "label": "Rust" });
        let r = Resource::new(tags("slug"), attrs.as_object().unwrap().clone());
        assert_eq!(r.id, json!("rust"));
        assert_eq!(r.attributes["slug"], json!("rust"));
        assert_eq!(id_string(&r.id), "rust");
        assert_eq!(id_string(&json!(7)), "7");
    }
}
