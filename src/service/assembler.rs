//! Loads rows and materializes them as Resources.

use crate::config::{Collection, FieldType};
use crate::error::AppError;
use crate::resource::Resource;
use crate::service::coerce::parse_datetime;
use crate::service::translate::QueryTranslator;
use crate::sql::SelectQuery;
use crate::store::{Row, Store};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A resource with the raw row it was built from (foreign keys live only in the row).
pub struct Loaded {
    pub resource: Resource,
    pub row: Row,
}

#[derive(Clone, Copy)]
pub struct ResourceAssembler<'a> {
    store: &'a dyn Store,
}

impl<'a> ResourceAssembler<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        ResourceAssembler { store }
    }

    /// Raw row by identifier; `None` when absent.
    pub async fn load_row(&self, id: &Value, collection: &Collection) -> Result<Option<Row>, AppError> {
        let query = QueryTranslator::by_identifier(collection, id);
        Ok(self.store.fetch(&query).await?.into_iter().next())
    }

    pub async fn load_one(&self, id: &Value, collection: &Arc<Collection>) -> Result<Option<Resource>, AppError> {
        Ok(self.load(id, collection).await?.map(|l| l.resource))
    }

    pub async fn load(&self, id: &Value, collection: &Arc<Collection>) -> Result<Option<Loaded>, AppError> {
        let row = self.load_row(id, collection).await?;
        Ok(row.map(|row| Loaded {
            resource: assemble(collection, &row),
            row,
        }))
    }

    pub async fn load_many(&self, query: &SelectQuery, collection: &Arc<Collection>) -> Result<Vec<Loaded>, AppError> {
        let rows = self.store.fetch(query).await?;
        Ok(rows
            .into_iter()
            .map(|row| Loaded {
                resource: assemble(collection, &row),
                row,
            })
            .collect())
    }

    pub async fn count(&self, query: &SelectQuery) -> Result<u64, AppError> {
        self.store.count(query).await
    }
}

pub fn assemble(collection: &Arc<Collection>, row: &Row) -> Resource {
    Resource::new(Arc::clone(collection), format_resource(row, collection))
}

/// Declared fields present in the row, normalized by type. Fields missing from the row are omitted.
pub fn format_resource(row: &Row, collection: &Collection) -> Map<String, Value> {
    let mut out = Map::new();
    for field in &collection.fields {
        let Some(value) = row.get(&field.name) else {
            continue;
        };
        out.insert(field.name.clone(), format_value(field.field_type, value));
    }
    out
}

fn format_value(field_type: FieldType, value: &Value) -> Value {
    match (field_type, value) {
        (FieldType::Boolean, v) => Value::Bool(truthy(v)),
        (_, Value::Array(_) | Value::Object(_)) => Value::String(value.to_string()),
        (FieldType::Date, Value::String(s)) => match parse_datetime(s) {
            Some(dt) => Value::String(dt.to_rfc3339()),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !matches!(s.to_ascii_lowercase().as_str(), "" | "0" | "f" | "false"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve, SchemaConfig};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn events() -> Arc<Collection> {
        let config: SchemaConfig = serde_json::from_value(json!({
            "collections": [{
                "name": "events",
                "fields": [
                    { "field": "id", "type": "Number" },
                    { "field": "title", "type": "String" },
                    { "field": "starts_at", "type": "Date" },
                    { "field": "public", "type": "Boolean" },
                    { "field": "tags", "type": "Json" },
                    { "field": "venue", "type": "Number", "reference": "venues", "foreign_key": "venue_id" }
                ]
            }, {
                "name": "venues",
                "fields": [{ "field": "id", "type": "Number" }]
            }]
        }))
        .unwrap();
        resolve(&config).unwrap().find_collection("events").unwrap()
    }

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn formats_present_fields_and_skips_absent_ones() {
        let attrs = format_resource(
            &row(json!({
                "id": 1,
                "title": "Launch",
                "starts_at": "2024-03-01 09:00:00",
                "public": "f",
                "tags": ["a", "b"],
                "venue_id": 4,
                "internal": "x"
            })),
            &events(),
        );
        assert_eq!(attrs["title"], json!("Launch"));
        assert_eq!(attrs["starts_at"], json!("2024-03-01T09:00:00+00:00"));
        assert_eq!(attrs["public"], json!(false));
        assert_eq!(attrs["tags"], json!(r#"["a","b"]"#));
        assert!(!attrs.contains_key("venue"));
        assert!(!attrs.contains_key("internal"));
    }

    #[test]
    fn booleans_are_strict() {
        for (raw, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("yes"), true),
            (json!(null), false),
            (json!(""), false),
            (json!("0"), false),
            (json!(0), false),
        ] {
            assert_eq!(format_value(FieldType::Boolean, &raw), json!(expected), "{raw}");
        }
    }

    #[tokio::test]
    async fn load_one_returns_none_for_missing_id() {
        let store = MemoryStore::new().with_table("events", &["id", "title"], vec![json!({ "id": 1, "title": "A" })]);
        let assembler = ResourceAssembler::new(&store);
        let c = events();
        let found = assembler.load_one(&json!("1"), &c).await.unwrap().unwrap();
        assert_eq!(found.id, json!(1));
        assert_eq!(found.attributes["title"], json!("A"));
        assert!(assembler.load_one(&json!("99"), &c).await.unwrap().is_none());
    }
}
