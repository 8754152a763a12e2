//! JSON:API documents: resource objects, relationships, included side-loads.

use crate::config::{Collection, Field, SchemaRegistry};
use crate::resource::{id_string, Relationship, Resource};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum PrimaryData {
    One(Option<ResourceObject>),
    Many(Vec<ResourceObject>),
}

#[derive(Serialize, Debug)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl Document {
    pub fn without_links(mut self) -> Self {
        self.links = None;
        self
    }
}

#[derive(Serialize, Debug)]
pub struct MetaCount {
    pub count: u64,
}

#[derive(Serialize, Debug, Default)]
pub struct Links {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, RelationshipObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

/// `Null` renders as `"data": null`.
#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum Linkage {
    Null,
    One(ResourceIdentifier),
}

#[derive(Serialize, Debug)]
pub struct RelationshipObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Linkage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

/// Builds documents; links are rooted at `link_prefix` (e.g. `/forest`).
#[derive(Clone, Debug)]
pub struct Encoder {
    link_prefix: String,
}

impl Encoder {
    pub fn new(link_prefix: impl Into<String>) -> Self {
        Encoder {
            link_prefix: link_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Single resource (or none). Top-level links are stripped.
    pub fn encode_one(&self, resource: Option<&Resource>) -> Document {
        let type_name = resource.map(|r| r.type_name().to_string()).unwrap_or_default();
        let included = resource.map(|r| self.included(std::slice::from_ref(r))).unwrap_or_default();
        Document {
            data: PrimaryData::One(resource.map(|r| self.resource_object(r))),
            included,
            meta: None,
            links: Some(self.collection_links(&type_name)),
        }
        .without_links()
    }

    /// List of `type_name` resources with the unpaginated total.
    pub fn encode_many(&self, type_name: &str, resources: &[Resource], count: u64) -> Document {
        Document {
            data: PrimaryData::Many(resources.iter().map(|r| self.resource_object(r)).collect()),
            included: self.included(resources),
            meta: Some(MetaCount { count }),
            links: Some(self.collection_links(type_name)),
        }
    }

    /// Every registered collection as a `collections` resource, in registration order.
    pub fn encode_collections(&self, registry: &SchemaRegistry) -> Document {
        Document {
            data: PrimaryData::Many(registry.collections().iter().map(|c| collection_object(c)).collect()),
            included: Vec::new(),
            meta: None,
            links: None,
        }
    }

    fn collection_links(&self, type_name: &str) -> Links {
        Links {
            self_: Some(format!("{}/{}", self.link_prefix, type_name)),
            related: None,
        }
    }

    fn resource_object(&self, r: &Resource) -> ResourceObject {
        let id = id_string(&r.id);
        let relationships = r
            .relationships
            .iter()
            .map(|rel| (rel.field_name.clone(), self.relationship_object(r.type_name(), &id, rel)))
            .collect();
        ResourceObject {
            type_: r.type_name().to_string(),
            id,
            attributes: r.attributes.clone(),
            relationships,
            links: None,
        }
    }

    fn relationship_object(&self, owner_type: &str, owner_id: &str, rel: &Relationship) -> RelationshipObject {
        let related = Some(Links {
            self_: None,
            related: Some(format!(
                "{}/{}/{}/relationships/{}",
                self.link_prefix, owner_type, owner_id, rel.field_name
            )),
        });
        match (&rel.id, rel.is_to_one()) {
            (Some(id), true) => RelationshipObject {
                data: Some(Linkage::One(ResourceIdentifier {
                    type_: rel.target_type.clone(),
                    id: id_string(id),
                })),
                links: related,
            },
            (None, true) => RelationshipObject {
                data: Some(Linkage::Null),
                links: None,
            },
            (_, false) => RelationshipObject { data: None, links: related },
        }
    }

    /// Included objects of all resources, first occurrence of each (type, id) kept.
    fn included(&self, resources: &[Resource]) -> Vec<ResourceObject> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for inc in resources.iter().flat_map(|r| r.included.iter()) {
            let id = id_string(&inc.id);
            if !seen.insert((inc.type_name().to_string(), id.clone())) {
                continue;
            }
            let mut obj = self.resource_object(inc);
            obj.links = Some(Links {
                self_: Some(format!("{}/{}/{}", self.link_prefix, inc.type_name(), id)),
                related: None,
            });
            out.push(obj);
        }
        out
    }
}

fn collection_object(collection: &Collection) -> ResourceObject {
    let mut attributes = Map::new();
    attributes.insert("name".into(), Value::String(collection.name.clone()));
    attributes.insert("fields".into(), collection.fields.iter().map(field_object).collect());
    attributes.insert("only-for-relationships".into(), Value::Null);
    attributes.insert("is-virtual".into(), Value::Null);
    attributes.insert("is-read-only".into(), Value::Bool(false));
    attributes.insert("is-searchable".into(), Value::Bool(true));
    ResourceObject {
        type_: "collections".into(),
        id: collection.name.clone(),
        attributes,
        relationships: BTreeMap::new(),
        links: None,
    }
}

fn field_object(field: &Field) -> Value {
    let mut obj = json!({ "field": field.name, "type": field.field_type });
    if let Some(reference) = &field.reference {
        obj["reference"] = json!(reference);
        obj["relationship"] = json!(field.cardinality);
    }
    if let Some(fk) = &field.foreign_key {
        obj["foreign_key"] = json!(fk);
    }
    obj
}

pub fn ok(doc: Document) -> (StatusCode, Json<Document>) {
    (StatusCode::OK, Json(doc))
}

pub fn created(doc: Document) -> (StatusCode, Json<Document>) {
    (StatusCode::CREATED, Json(doc))
}
