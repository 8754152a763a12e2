//! In-memory store. Evaluates the same query model the SQL builder renders.

use crate::error::AppError;
use crate::filter::SortDirection;
use crate::sql::{CompareOp, Predicate, SelectQuery};
use crate::store::{Row, Store, TableRef};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Register a table with its columns and initial rows (JSON objects).
    pub fn with_table(self, name: &str, columns: &[&str], rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(m) => Some(m),
                _ => None,
            })
            .collect();
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(
                name.to_string(),
                Table {
                    columns: columns.iter().map(|c| c.to_string()).collect(),
                    rows,
                },
            );
        }
        self
    }

    /// Snapshot of a table's rows, for assertions.
    pub fn rows(&self, name: &str) -> Vec<Row> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(name).map(|t| t.rows.clone()))
            .unwrap_or_default()
    }

    fn read<T>(&self, name: &str, f: impl FnOnce(&Table) -> T) -> Result<T, AppError> {
        let tables = self.tables.read().map_err(|_| AppError::Store("lock poisoned".into()))?;
        let table = tables
            .get(name)
            .ok_or_else(|| AppError::Store(format!("no such table: {}", name)))?;
        Ok(f(table))
    }

    fn write<T>(&self, name: &str, f: impl FnOnce(&mut Table) -> T) -> Result<T, AppError> {
        let mut tables = self.tables.write().map_err(|_| AppError::Store("lock poisoned".into()))?;
        let table = tables
            .get_mut(name)
            .ok_or_else(|| AppError::Store(format!("no such table: {}", name)))?;
        Ok(f(table))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, query: &SelectQuery) -> Result<Vec<Row>, AppError> {
        let mut rows: Vec<Row> = self.read(&query.table, |t| {
            t.rows.iter().filter(|r| matches_all(r, &query.predicates)).cloned().collect()
        })?;
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_nullable(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &SelectQuery) -> Result<u64, AppError> {
        self.read(&query.table, |t| {
            t.rows.iter().filter(|r| matches_all(r, &query.predicates)).count() as u64
        })
    }

    async fn columns(&self, table: &TableRef) -> Result<HashSet<String>, AppError> {
        self.read(&table.table, |t| t.columns.iter().cloned().collect())
    }

    async fn insert(&self, table: &TableRef, values: &Row) -> Result<Row, AppError> {
        self.write(&table.table, |t| {
            let mut row = Row::new();
            for c in &t.columns {
                row.insert(c.clone(), values.get(c).cloned().unwrap_or(Value::Null));
            }
            if row.get(&table.key).map_or(true, Value::is_null) {
                let next = t
                    .rows
                    .iter()
                    .filter_map(|r| r.get(&table.key).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
                    + 1;
                row.insert(table.key.clone(), Value::from(next));
            }
            t.rows.push(row.clone());
            row
        })
    }

    async fn update(&self, table: &TableRef, id: &Value, values: &Row) -> Result<Option<Row>, AppError> {
        self.write(&table.table, |t| {
            let row = t
                .rows
                .iter_mut()
                .find(|r| r.get(&table.key).is_some_and(|v| loose_eq(v, id)))?;
            for (k, v) in values {
                row.insert(k.clone(), v.clone());
            }
            Some(row.clone())
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

fn matches_all(row: &Row, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| matches(row, p))
}

static NULL: Value = Value::Null;

fn matches(row: &Row, p: &Predicate) -> bool {
    let cell = |c: &str| row.get(c).unwrap_or(&NULL);
    match p {
        Predicate::Compare { column, op, param } => {
            let v = cell(column);
            if v.is_null() || param.value.is_null() {
                return false;
            }
            match op {
                CompareOp::Eq => loose_eq(v, &param.value),
                CompareOp::NotEq => !loose_eq(v, &param.value),
                CompareOp::Lt => compare(v, &param.value) == Some(Ordering::Less),
                CompareOp::Gt => compare(v, &param.value) == Some(Ordering::Greater),
            }
        }
        Predicate::TextEq { column, value } => text_of(cell(column)).is_some_and(|s| s == *value),
        Predicate::TextCompare { column, op, value } => text_of(cell(column)).is_some_and(|s| match op {
            CompareOp::Eq => s == *value,
            CompareOp::NotEq => s != *value,
            CompareOp::Lt => s < *value,
            CompareOp::Gt => s > *value,
        }),
        Predicate::Like { column, pattern } => text_of(cell(column)).is_some_and(|s| like(&s, pattern)),
        Predicate::IsNull(column) => cell(column).is_null(),
        Predicate::IsNotNull(column) => !cell(column).is_null(),
        Predicate::Or(parts) => parts.iter().any(|p| matches(row, p)),
    }
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => n.to_string() == *s,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
    }
}

/// SQL LIKE with `%` and `_` wildcards.
fn like(s: &str, pattern: &str) -> bool {
    let s: Vec<char> = s.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut si, mut pi) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while si < s.len() {
        if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, si));
            pi += 1;
        } else if pi < p.len() && (p[pi] == '_' || p[pi] == s[si]) {
            si += 1;
            pi += 1;
        } else if let Some((bp, bs)) = backtrack {
            pi = bp + 1;
            si = bs + 1;
            backtrack = Some((bp, bs + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}
