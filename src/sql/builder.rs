//! Renders queries to parameterized PostgreSQL: identifiers from the schema, values as parameters.

use crate::sql::query::{Param, Predicate, SelectQuery};
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from schema).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", quoted(s), quoted(table)),
        None => quoted(table),
    }
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    fn push_param(&mut self, v: Value) -> u32 {
        self.params.push(v);
        self.params.len() as u32
    }

    /// Nulls and literals are written inline so they take the column's type.
    fn placeholder(&mut self, p: &Param) -> String {
        match &p.value {
            Value::Null => return "NULL".to_string(),
            Value::String(s) if p.literal => return string_literal(s),
            _ => {}
        }
        let value = match p.cast {
            Some("jsonb") => Value::String(json_text(&p.value)),
            _ => p.value.clone(),
        };
        let n = self.push_param(value);
        match p.cast {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }
}

/// Escape-string literal; safe regardless of `standard_conforming_strings`.
fn string_literal(s: &str) -> String {
    format!("E'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// JSON text for a jsonb parameter. Strings that already hold JSON are sent as is.
fn json_text(v: &Value) -> String {
    match v {
        Value::String(s) if serde_json::from_str::<Value>(s).is_ok() => s.clone(),
        other => other.to_string(),
    }
}

fn predicate_sql(q: &mut QueryBuf, p: &Predicate) -> String {
    match p {
        Predicate::Compare { column, op, param } => {
            let ph = q.placeholder(param);
            format!("{} {} {}", quoted(column), op.as_sql(), ph)
        }
        Predicate::TextEq { column, value } => {
            let n = q.push_param(Value::String(value.clone()));
            format!("{}::text = ${}", quoted(column), n)
        }
        Predicate::TextCompare { column, op, value } => {
            let n = q.push_param(Value::String(value.clone()));
            format!("{}::text {} ${}", quoted(column), op.as_sql(), n)
        }
        Predicate::Like { column, pattern } => {
            let n = q.push_param(Value::String(pattern.clone()));
            format!("{}::text LIKE ${}", quoted(column), n)
        }
        Predicate::IsNull(column) => format!("{} IS NULL", quoted(column)),
        Predicate::IsNotNull(column) => format!("{} IS NOT NULL", quoted(column)),
        Predicate::Or(parts) if parts.is_empty() => "FALSE".to_string(),
        Predicate::Or(parts) => {
            let rendered: Vec<String> = parts.iter().map(|p| predicate_sql(q, p)).collect();
            format!("({})", rendered.join(" OR "))
        }
    }
}

fn where_clause(q: &mut QueryBuf, predicates: &[Predicate]) -> String {
    if predicates.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = predicates.iter().map(|p| predicate_sql(q, p)).collect();
    format!(" WHERE {}", parts.join(" AND "))
}

/// SELECT * with WHERE, ORDER BY, LIMIT, OFFSET as described by the query.
pub fn select(query: &SelectQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(query.schema.as_deref(), &query.table);
    let where_clause = where_clause(&mut q, &query.predicates);
    let order_clause = query
        .order
        .as_ref()
        .map(|o| format!(" ORDER BY {} {}", quoted(&o.column), o.direction.as_sql()))
        .unwrap_or_default();
    let limit_clause = query.limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = query.offset.map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    q.sql = format!(
        "SELECT * FROM {}{}{}{}{}",
        table, where_clause, order_clause, limit_clause, offset_clause
    );
    q
}

/// SELECT COUNT(*) over the filter only; ordering and pagination are dropped.
pub fn count(query: &SelectQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(query.schema.as_deref(), &query.table);
    let where_clause = where_clause(&mut q, &query.predicates);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", table, where_clause);
    q
}

/// INSERT the given column values, returning the stored row.
pub fn insert(
    schema: Option<&str>,
    table: &str,
    values: &Map<String, Value>,
    param: &dyn Fn(&str, &Value) -> Param,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, table);
    if values.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table);
        return q;
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (name, val) in values {
        cols.push(quoted(name));
        placeholders.push(q.placeholder(&param(name, val)));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        table,
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE by key: SET only the given columns.
pub fn update(
    schema: Option<&str>,
    table: &str,
    key: &str,
    id: &Value,
    values: &Map<String, Value>,
    param: &dyn Fn(&str, &Value) -> Param,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, table);
    let sets: Vec<String> = values
        .iter()
        .map(|(name, val)| {
            let ph = q.placeholder(&param(name, val));
            format!("{} = {}", quoted(name), ph)
        })
        .collect();
    let id_ph = q.placeholder(&param(key, id));
    if sets.is_empty() {
        q.sql = format!("SELECT * FROM {} WHERE {} = {}", table, quoted(key), id_ph);
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING *",
        table,
        sets.join(", "),
        quoted(key),
        id_ph
    );
    q
}

/// Column names of a table from information_schema.
pub fn table_columns(schema: Option<&str>, table: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let s = q.push_param(Value::String(schema.unwrap_or("public").to_string()));
    let t = q.push_param(Value::String(table.to_string()));
    q.sql = format!(
        "SELECT column_name::text FROM information_schema.columns WHERE table_schema = ${} AND table_name = ${} ORDER BY ordinal_position",
        s, t
    );
    q
}
