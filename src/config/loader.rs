//! Load the schema document from disk and resolve it into a registry.

use crate::config::resolved::{Collection, Field, RelationKind, RelationshipSpec, SchemaRegistry};
use crate::config::types::*;
use crate::config::validate;
use crate::error::SchemaError;
use std::collections::BTreeMap;
use std::path::Path;

/// Build the registry from a schema document (validates first).
pub fn resolve(config: &SchemaConfig) -> Result<SchemaRegistry, SchemaError> {
    validate(config)?;

    let mut collections = Vec::with_capacity(config.collections.len());
    for c in &config.collections {
        let fields: Vec<Field> = c.fields.iter().map(resolve_field).collect();

        let mut relationships = BTreeMap::new();
        for f in fields.iter() {
            let Some(target) = &f.reference else { continue };
            let kind = if f.is_to_many() {
                RelationKind::ToMany {
                    inverse_key: f.foreign_key.clone(),
                }
            } else {
                RelationKind::ToOne {
                    foreign_key: f.column().to_string(),
                }
            };
            relationships.insert(
                target.clone(),
                RelationshipSpec {
                    target: target.clone(),
                    field: f.name.clone(),
                    kind,
                },
            );
        }

        collections.push(Collection {
            name: c.name.clone(),
            table: c.table.clone().unwrap_or_else(|| c.name.clone()),
            schema: c.schema.clone(),
            identifier: c.identifier.clone(),
            fields,
            relationships,
        });
    }

    tracing::debug!(count = collections.len(), "schema resolved");
    Ok(SchemaRegistry::new(collections))
}

fn resolve_field(f: &FieldConfig) -> Field {
    let cardinality = match (&f.reference, f.relationship) {
        (Some(_), Some(c)) => Some(c),
        (Some(_), None) => Some(Cardinality::ToOne),
        (None, _) => None,
    };
    Field {
        name: f.field.clone(),
        field_type: f.type_,
        reference: f.reference.clone(),
        foreign_key: f.foreign_key.clone(),
        cardinality,
    }
}

/// Read a schema document (JSON) from `path`.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<SchemaConfig, SchemaError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SchemaError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| SchemaError::Load(format!("{}: {}", path.display(), e)))
}
