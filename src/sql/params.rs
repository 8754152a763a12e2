//! Bind serde_json::Value parameters onto sqlx queries.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::{Query, QueryScalar};

/// A parameter in a shape sqlx can bind. Strings stay text; typed columns get a cast in the SQL.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
    Json(Value),
}

impl From<&Value> for BindValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => BindValue::I64(i),
                (None, Some(f)) => BindValue::F64(f),
                (None, None) => BindValue::Text(n.to_string()),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Json(v.clone()),
        }
    }
}

macro_rules! bind_each {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for p in $params {
            query = match BindValue::from(p) {
                BindValue::Null => query.bind(None::<String>),
                BindValue::Bool(b) => query.bind(b),
                BindValue::I64(n) => query.bind(n),
                BindValue::F64(n) => query.bind(n),
                BindValue::Text(s) => query.bind(s),
                BindValue::Json(v) => query.bind(sqlx::types::Json(v)),
            };
        }
        query
    }};
}

pub fn bind_params<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    bind_each!(query, params)
}

pub fn bind_params_scalar<'q, O>(
    query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: &[Value],
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    bind_each!(query, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_json_values() {
        assert_eq!(BindValue::from(&json!(null)), BindValue::Null);
        assert_eq!(BindValue::from(&json!(5)), BindValue::I64(5));
        assert_eq!(BindValue::from(&json!(1.5)), BindValue::F64(1.5));
        assert_eq!(BindValue::from(&json!("x")), BindValue::Text("x".into()));
        assert_eq!(BindValue::from(&json!([1])), BindValue::Json(json!([1])));
    }
}
