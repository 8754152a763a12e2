//! Raw schema document as produced by schema discovery.

use serde::{Deserialize, Serialize};

/// Declared field type. Names follow the discovery output (`"String"`, `"Number"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Enum,
    Json,
    Uuid,
}

impl FieldType {
    /// SQL cast applied to bound parameters so text values compare against typed columns.
    pub fn sql_cast(&self) -> Option<&'static str> {
        match self {
            FieldType::Date => Some("timestamptz"),
            FieldType::Uuid => Some("uuid"),
            FieldType::Json => Some("jsonb"),
            _ => None,
        }
    }

    /// Enum columns have no implicit cast from text: reads compare their text form,
    /// writes send an untyped literal that takes the column's type.
    pub fn is_enum(&self) -> bool {
        matches!(self, FieldType::Enum)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub field: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    /// Name of the referenced collection, for association fields.
    #[serde(default)]
    pub reference: Option<String>,
    /// To-one: column on this collection. To-many: column on the referenced collection pointing back.
    #[serde(default)]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub relationship: Option<Cardinality>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Table backing the collection; defaults to the collection name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_identifier")]
    pub identifier: String,
    pub fields: Vec<FieldConfig>,
}

fn default_identifier() -> String {
    "id".into()
}

/// The whole document handed over at startup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub collections: Vec<CollectionConfig>,
}

impl SchemaConfig {
    /// Give `schema` to every collection that does not name one.
    pub fn with_default_schema(mut self, schema: Option<&str>) -> Self {
        if let Some(schema) = schema {
            for c in self.collections.iter_mut().filter(|c| c.schema.is_none()) {
                c.schema = Some(schema.to_string());
            }
        }
        self
    }
}
