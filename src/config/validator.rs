//! Schema validation: identifiers, unique names, one relationship per target.

use crate::config::SchemaConfig;
use crate::error::SchemaError;
use std::collections::HashSet;

pub fn validate(config: &SchemaConfig) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for c in &config.collections {
        if !names.insert(c.name.as_str()) {
            return Err(SchemaError::DuplicateCollection(c.name.clone()));
        }
        if !c.fields.iter().any(|f| f.field == c.identifier) {
            return Err(SchemaError::InvalidIdentifier {
                collection: c.name.clone(),
                field: c.identifier.clone(),
            });
        }
        let mut targets = HashSet::new();
        for f in &c.fields {
            if let Some(target) = &f.reference {
                if !targets.insert(target.as_str()) {
                    return Err(SchemaError::DuplicateRelationship {
                        collection: c.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}
