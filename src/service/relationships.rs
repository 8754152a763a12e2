//! Attaches relationship descriptors and side-loads to-one targets, one level deep.

use crate::config::{RelationKind, SchemaRegistry};
use crate::error::AppError;
use crate::resource::{Relationship, Resource};
use crate::service::assembler::ResourceAssembler;
use crate::store::Row;

pub struct RelationshipResolver<'a> {
    registry: &'a SchemaRegistry,
    assembler: ResourceAssembler<'a>,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry, assembler: ResourceAssembler<'a>) -> Self {
        RelationshipResolver { registry, assembler }
    }

    /// `row` is the raw row `resource` was assembled from.
    pub async fn resolve(&self, resource: &mut Resource, row: &Row) -> Result<(), AppError> {
        let collection = resource.collection.clone();
        for (key, spec) in &collection.relationships {
            let target = self
                .registry
                .find_collection(&spec.target)
                .map_err(|e| AppError::association(key.clone(), e))?;
            let id = match &spec.kind {
                RelationKind::ToOne { foreign_key } => row.get(foreign_key).filter(|v| !v.is_null()).cloned(),
                RelationKind::ToMany { .. } => None,
            };
            resource.add_relationship(Relationship {
                target_type: target.name.clone(),
                target_identifier: target.identifier.clone(),
                field_name: spec.field.clone(),
                kind: spec.kind.clone(),
                id,
            });
        }

        let pending: Vec<_> = resource
            .relationships
            .iter()
            .filter(|r| r.is_to_one())
            .filter_map(|r| r.id.clone().map(|id| (r.target_type.clone(), id)))
            .collect();
        for (target_type, id) in pending {
            let target = self
                .registry
                .find_collection(&target_type)
                .map_err(|e| AppError::association(target_type.clone(), e))?;
            match self.assembler.load_one(&id, &target).await? {
                Some(mut related) => {
                    related.set_type(target_type);
                    resource.include(related);
                }
                None => tracing::debug!(collection = %target.name, id = %id, "dangling foreign key"),
            }
        }
        Ok(())
    }
}
