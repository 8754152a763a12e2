//! PostgreSQL store on a sqlx pool.

use crate::error::AppError;
use crate::sql::builder;
use crate::sql::{bind_params, bind_params_scalar, QueryBuf, SelectQuery};
use crate::store::{Row, Store, TableRef};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row as _, TypeInfo};
use std::collections::HashSet;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_json))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn fetch(&self, query: &SelectQuery) -> Result<Vec<Row>, AppError> {
        self.query_many(&builder::select(query)).await
    }

    async fn count(&self, query: &SelectQuery) -> Result<u64, AppError> {
        let q = builder::count(query);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let n: i64 = bind_params_scalar(sqlx::query_scalar(&q.sql), &q.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    async fn columns(&self, table: &TableRef) -> Result<HashSet<String>, AppError> {
        let q = builder::table_columns(table.schema.as_deref(), &table.table);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let names: Vec<String> = bind_params_scalar(sqlx::query_scalar(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    async fn insert(&self, table: &TableRef, values: &Row) -> Result<Row, AppError> {
        let q = builder::insert(table.schema.as_deref(), &table.table, values, &|c, v| table.param(c, v));
        self.query_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, table: &TableRef, id: &Value, values: &Row) -> Result<Option<Row>, AppError> {
        let q = builder::update(
            table.schema.as_deref(),
            &table.table,
            &table.key,
            id,
            values,
            &|c, v| table.param(c, v),
        );
        self.query_optional(&q).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Row {
    let mut map = Row::new();
    for (i, col) in row.columns().iter().enumerate() {
        map.insert(col.name().to_string(), cell_to_value(row, i, col.type_info().name()));
    }
    map
}

/// Decode by declared column type. Dates come back as ISO-8601 strings; unknown types fall back to text.
fn cell_to_value(row: &PgRow, i: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r PgRow, i: usize) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<Option<T>, _>(i).ok().flatten()
    }

    let v = match type_name {
        "INT2" => get::<i16>(row, i).map(Value::from),
        "INT4" => get::<i32>(row, i).map(Value::from),
        "INT8" => get::<i64>(row, i).map(Value::from),
        "FLOAT4" => get::<f32>(row, i).and_then(|n| serde_json::Number::from_f64(n as f64)).map(Value::Number),
        "FLOAT8" => get::<f64>(row, i).and_then(serde_json::Number::from_f64).map(Value::Number),
        "BOOL" => get::<bool>(row, i).map(Value::Bool),
        "UUID" => get::<uuid::Uuid>(row, i).map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => get::<chrono::DateTime<chrono::Utc>>(row, i).map(|d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => get::<chrono::NaiveDateTime>(row, i)
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => get::<chrono::NaiveDate>(row, i).map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        "JSON" | "JSONB" => get::<Value>(row, i),
        // text-like and user enums; enum labels decode as their text
        _ => row
            .try_get_unchecked::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String),
    };
    v.unwrap_or(Value::Null)
}
