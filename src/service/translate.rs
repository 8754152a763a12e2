//! Compiles a FilterDescriptor against a Collection into select and count queries.

use crate::config::{Collection, Field, FieldType};
use crate::filter::{FieldCondition, FilterDescriptor, Operator, SortDirection};
use crate::sql::{CompareOp, Param, Predicate, SelectQuery};
use serde_json::Value;

/// Paginated select plus the unpaginated duplicate used for the total count.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslatedQuery {
    pub select: SelectQuery,
    pub count: SelectQuery,
}

pub struct QueryTranslator;

impl QueryTranslator {
    pub fn build(collection: &Collection, filter: &FilterDescriptor) -> TranslatedQuery {
        Self::build_from(Self::base(collection), collection, filter)
    }

    /// Same as `build`, starting from a query that already carries predicates (e.g. a parent key).
    pub fn build_from(query: SelectQuery, collection: &Collection, filter: &FilterDescriptor) -> TranslatedQuery {
        let mut query = Self::filter_query(query, collection, filter);
        let count = query.unpaginated();
        let (limit, offset) = filter.pagination();
        query.paginate(limit, offset);
        TranslatedQuery { select: query, count }
    }

    pub fn base(collection: &Collection) -> SelectQuery {
        SelectQuery::new(collection.schema.as_deref(), &collection.table)
    }

    /// Equality on the identifier column, with the id typed for the identifier field.
    pub fn by_identifier(collection: &Collection, id: &Value) -> SelectQuery {
        let param = match collection.identifier_field() {
            Some(field) => Param::with_cast(typed_id(field.field_type, id), field.field_type.sql_cast()),
            None => Param::new(id.clone()),
        };
        Self::base(collection).filter(Predicate::Compare {
            column: collection.identifier.clone(),
            op: CompareOp::Eq,
            param,
        })
    }

    fn filter_query(mut query: SelectQuery, collection: &Collection, filter: &FilterDescriptor) -> SelectQuery {
        if let Some(term) = &filter.search {
            query.push(search_predicate(collection, term));
        }

        for condition in &filter.conditions {
            let Some(field) = collection.field(&condition.field).filter(|f| !f.is_to_many()) else {
                tracing::debug!(collection = %collection.name, field = %condition.field, "skipping filter on unknown field");
                continue;
            };
            match condition_predicate(field, condition) {
                Some(predicate) => query.push(predicate),
                None => tracing::debug!(
                    collection = %collection.name,
                    field = %condition.field,
                    value = %condition.value,
                    "skipping filter value that does not fit the field type"
                ),
            }
        }

        match filter.sort.as_ref().and_then(|s| collection.field(&s.field).map(|f| (f, s.direction))) {
            Some((field, direction)) if !field.is_to_many() => query.order_by(field.column(), direction),
            _ => query.order_by(&collection.identifier, SortDirection::Asc),
        }
        query
    }
}

/// Identifier OR any String field, compared by exact equality.
fn search_predicate(collection: &Collection, term: &str) -> Predicate {
    let parts = collection
        .fields
        .iter()
        .filter(|f| f.name == collection.identifier || f.field_type == FieldType::String)
        .filter(|f| !f.is_to_many())
        .map(|f| Predicate::TextEq {
            column: f.column().to_string(),
            value: term.to_string(),
        })
        .collect();
    Predicate::Or(parts)
}

/// `None` when a comparison value cannot be typed for the field.
fn condition_predicate(field: &Field, condition: &FieldCondition) -> Option<Predicate> {
    let column = field.column().to_string();
    let v = &condition.value;
    let compare = |op: CompareOp| {
        if field.field_type.is_enum() {
            return Some(Predicate::TextCompare {
                column: column.clone(),
                op,
                value: v.clone(),
            });
        }
        Some(Predicate::Compare {
            column: column.clone(),
            op,
            param: Param::with_cast(typed_value(field.field_type, v)?, field.field_type.sql_cast()),
        })
    };
    match condition.operator {
        Operator::NotEquals => compare(CompareOp::NotEq),
        // "greater than" selects rows below the value and vice versa
        Operator::GreaterThan => compare(CompareOp::Lt),
        Operator::LessThan => compare(CompareOp::Gt),
        Operator::Contains => Some(Predicate::Like {
            column,
            pattern: format!("%{}%", v),
        }),
        Operator::StartsWith => Some(Predicate::Like {
            column,
            pattern: format!("{}%", v),
        }),
        Operator::EndsWith => Some(Predicate::Like {
            column,
            pattern: format!("%{}", v),
        }),
        Operator::IsPresent => Some(Predicate::IsNotNull(column)),
        Operator::IsBlank => Some(Predicate::Or(vec![
            Predicate::IsNull(column.clone()),
            Predicate::TextEq {
                column,
                value: String::new(),
            },
        ])),
        Operator::Equals => compare(CompareOp::Eq),
    }
}

/// Type a query-string value for its field so it binds against the column.
fn typed_value(field_type: FieldType, s: &str) -> Option<Value> {
    match field_type {
        FieldType::Number => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(Value::from(n));
            }
            s.parse::<f64>().ok().and_then(serde_json::Number::from_f64).map(Value::Number)
        }
        FieldType::Boolean => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => Some(Value::String(s.to_string())),
    }
}

/// Ids arrive as strings from paths and payloads; type them like filter values.
pub fn typed_id(field_type: FieldType, id: &Value) -> Value {
    match id {
        Value::String(s) => typed_value(field_type, s).unwrap_or_else(|| id.clone()),
        other => other.clone(),
    }
}
