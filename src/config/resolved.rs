//! Resolved schema: validated and indexed for request-time lookup.

use crate::config::{Cardinality, FieldType};
use crate::error::CollectionNotFound;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub reference: Option<String>,
    pub foreign_key: Option<String>,
    pub cardinality: Option<Cardinality>,
}

impl Field {
    pub fn scalar(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            reference: None,
            foreign_key: None,
            cardinality: None,
        }
    }

    pub fn is_to_many(&self) -> bool {
        matches!(self.cardinality, Some(Cardinality::ToMany))
    }

    /// Storage column for this field. To-one associations store through their foreign key.
    pub fn column(&self) -> &str {
        match (&self.cardinality, &self.foreign_key) {
            (Some(Cardinality::ToOne), Some(fk)) => fk,
            _ => &self.name,
        }
    }
}

/// How a relationship is stored.
#[derive(Clone, Debug, PartialEq)]
pub enum RelationKind {
    /// We hold the key: `foreign_key` is our column.
    ToOne { foreign_key: String },
    /// They hold the key: `inverse_key` is their column pointing at our identifier.
    ToMany { inverse_key: Option<String> },
}

/// Static relationship descriptor, built once per collection at load time.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationshipSpec {
    /// Referenced collection name (also the relationship key).
    pub target: String,
    /// Field on this collection that declares the association.
    pub field: String,
    pub kind: RelationKind,
}

#[derive(Clone, Debug)]
pub struct Collection {
    pub name: String,
    pub table: String,
    pub schema: Option<String>,
    pub identifier: String,
    pub fields: Vec<Field>,
    /// Keyed by target collection name.
    pub relationships: BTreeMap<String, RelationshipSpec>,
}

impl Collection {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn identifier_field(&self) -> Option<&Field> {
        self.field(&self.identifier)
    }

    pub fn relationship(&self, key: &str) -> Option<&RelationshipSpec> {
        self.relationships.get(key)
    }
}

/// Process-wide, read-only set of collections.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    collections: Vec<Arc<Collection>>,
    by_name: HashMap<String, Arc<Collection>>,
}

impl SchemaRegistry {
    pub fn new(collections: Vec<Collection>) -> Self {
        let collections: Vec<Arc<Collection>> = collections.into_iter().map(Arc::new).collect();
        let by_name = collections
            .iter()
            .map(|c| (c.name.clone(), Arc::clone(c)))
            .collect();
        SchemaRegistry { collections, by_name }
    }

    pub fn collections(&self) -> &[Arc<Collection>] {
        &self.collections
    }

    pub fn find_collection(&self, name: &str) -> Result<Arc<Collection>, CollectionNotFound> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| CollectionNotFound(name.to_string()))
    }

    /// `Ok(None)` when the field references nothing; an error when it references a missing collection.
    pub fn find_related_collection(&self, field: &Field) -> Result<Option<Arc<Collection>>, CollectionNotFound> {
        match &field.reference {
            Some(name) => self.find_collection(name).map(Some),
            None => Ok(None),
        }
    }
}
