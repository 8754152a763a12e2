//! Request filtering intent: search, field conditions, sort, pagination.
//!
//! Parsed from query pairs such as `search=Doe&filter[age]=>30&sort=-created_at&page[size]=10&page[number]=3`.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    EndsWith,
    IsPresent,
    IsBlank,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl FieldCondition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        FieldCondition {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Parse the operator syntax of a `filter[field]` value.
    pub fn parse(field: &str, expr: &str) -> Self {
        let (operator, value) = match expr {
            "$present" => (Operator::IsPresent, ""),
            "$blank" => (Operator::IsBlank, ""),
            _ if expr.len() > 1 && expr.starts_with('*') && expr.ends_with('*') => {
                (Operator::Contains, &expr[1..expr.len() - 1])
            }
            _ if expr.len() > 1 && expr.starts_with('*') => (Operator::EndsWith, &expr[1..]),
            _ if expr.len() > 1 && expr.ends_with('*') => (Operator::StartsWith, &expr[..expr.len() - 1]),
            _ if expr.starts_with('!') => (Operator::NotEquals, &expr[1..]),
            _ if expr.starts_with('>') => (Operator::GreaterThan, &expr[1..]),
            _ if expr.starts_with('<') => (Operator::LessThan, &expr[1..]),
            _ => (Operator::Equals, expr),
        };
        FieldCondition::new(field, operator, value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    /// `field` ascending, `-field` descending.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (field, direction) = match s.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (s, SortDirection::Asc),
        };
        if field.is_empty() {
            return None;
        }
        Some(Sort {
            field: field.to_string(),
            direction,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterDescriptor {
    pub search: Option<String>,
    pub conditions: Vec<FieldCondition>,
    pub sort: Option<Sort>,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
}

fn bracket_key() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(filter|page)\[([^\]]+)\]$").ok()).as_ref()
}

impl FilterDescriptor {
    /// Parse query pairs in request order. Unknown keys and unparseable page values are ignored.
    pub fn from_query(params: &[(String, String)]) -> Self {
        let mut out = FilterDescriptor::default();
        for (k, v) in params {
            match k.as_str() {
                "search" => {
                    if !v.is_empty() {
                        out.search = Some(v.clone());
                    }
                }
                "sort" => out.sort = Sort::parse(v),
                _ => {
                    let Some(caps) = bracket_key().and_then(|re| re.captures(k)) else {
                        tracing::debug!(key = %k, "ignoring query parameter");
                        continue;
                    };
                    let inner = &caps[2];
                    match (&caps[1], inner) {
                        ("filter", field) => out.conditions.push(FieldCondition::parse(field, v)),
                        ("page", "size") => out.page_size = v.parse().ok(),
                        ("page", "number") => out.page_number = v.parse().ok(),
                        _ => tracing::debug!(key = %k, "ignoring query parameter"),
                    }
                }
            }
        }
        out
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_condition(mut self, condition: FieldCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_page(mut self, size: u32, number: Option<u32>) -> Self {
        self.page_size = Some(size);
        self.page_number = number;
        self
    }

    /// `(limit, offset)`; no limit without a page size, offset only when a page number is given.
    pub fn pagination(&self) -> (Option<u32>, Option<u32>) {
        match (self.page_size, self.page_number) {
            (Some(size), Some(number)) => (Some(size), Some(size.saturating_mul(number.max(1) - 1))),
            (Some(size), None) => (Some(size), None),
            (None, _) => (None, None),
        }
    }
}
