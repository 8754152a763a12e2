//! Store-neutral query description: table, predicates, ordering, limit/offset.

use crate::filter::SortDirection;
use serde_json::Value;

/// A bound value with an optional SQL cast (e.g. `timestamptz`).
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub value: Value,
    pub cast: Option<&'static str>,
    /// Render a string value as an escaped literal instead of binding it.
    pub literal: bool,
}

impl Param {
    pub fn new(value: Value) -> Self {
        Param::with_cast(value, None)
    }

    pub fn with_cast(value: Value, cast: Option<&'static str>) -> Self {
        Param {
            value,
            cast,
            literal: false,
        }
    }

    pub fn literal(value: Value) -> Self {
        Param {
            value,
            cast: None,
            literal: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare { column: String, op: CompareOp, param: Param },
    /// Exact match on the column's text form.
    TextEq { column: String, value: String },
    /// Comparison on the column's text form.
    TextCompare { column: String, op: CompareOp, value: String },
    Like { column: String, pattern: String },
    IsNull(String),
    IsNotNull(String),
    Or(Vec<Predicate>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

/// SELECT against one table. Predicates are combined with AND.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    pub schema: Option<String>,
    pub table: String,
    pub predicates: Vec<Predicate>,
    pub order: Option<OrderBy>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SelectQuery {
    pub fn new(schema: Option<&str>, table: &str) -> Self {
        SelectQuery {
            schema: schema.map(str::to_string),
            table: table.to_string(),
            predicates: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn order_by(&mut self, column: &str, direction: SortDirection) {
        self.order = Some(OrderBy {
            column: column.to_string(),
            direction,
        });
    }

    pub fn paginate(&mut self, limit: Option<u32>, offset: Option<u32>) {
        self.limit = limit;
        self.offset = offset;
    }

    /// Same filter without ordering or pagination; used for counting.
    pub fn unpaginated(&self) -> Self {
        SelectQuery {
            order: None,
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}
