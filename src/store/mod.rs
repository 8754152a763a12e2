//! Storage collaborator: executes queries and persists rows.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::AppError;
use crate::sql::{Param, SelectQuery};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One loaded row, column name to value.
pub type Row = Map<String, Value>;

/// Table location plus how typed columns take written values.
#[derive(Clone, Debug, Default)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub key: String,
    pub casts: Vec<(String, &'static str)>,
    /// Columns written as untyped literals (user enums).
    pub literals: Vec<String>,
}

impl TableRef {
    pub fn cast_for(&self, column: &str) -> Option<&'static str> {
        self.casts.iter().find(|(c, _)| c == column).map(|(_, t)| *t)
    }

    /// Parameter for writing `value` into `column`.
    pub fn param(&self, column: &str, value: &Value) -> Param {
        if self.literals.iter().any(|c| c == column) {
            return Param::literal(value.clone());
        }
        Param::with_cast(value.clone(), self.cast_for(column))
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(&self, query: &SelectQuery) -> Result<Vec<Row>, AppError>;

    async fn count(&self, query: &SelectQuery) -> Result<u64, AppError>;

    /// Column names physically present on the table.
    async fn columns(&self, table: &TableRef) -> Result<HashSet<String>, AppError>;

    /// Insert and return the stored row (including generated keys).
    async fn insert(&self, table: &TableRef, values: &Row) -> Result<Row, AppError>;

    /// Update the row whose key equals `id`; `None` when no row matched.
    async fn update(&self, table: &TableRef, id: &Value, values: &Row) -> Result<Option<Row>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
