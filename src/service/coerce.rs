//! Write-path coercion table keyed by declared field type.

use crate::config::FieldType;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// `(field name, raw value) -> coerced value`.
pub type Coercer = fn(&str, Value) -> Result<Value, AppError>;

pub fn coercer(field_type: FieldType) -> Coercer {
    match field_type {
        FieldType::Date => coerce_date,
        FieldType::Number => coerce_number,
        FieldType::Boolean => coerce_boolean,
        FieldType::String | FieldType::Enum | FieldType::Json | FieldType::Uuid => pass_through,
    }
}

/// Run the coercer for `field_type`. `null` is never touched.
pub fn coerce(field: &str, field_type: FieldType, value: Value) -> Result<Value, AppError> {
    if value.is_null() {
        return Ok(value);
    }
    coercer(field_type)(field, value)
}

fn pass_through(_: &str, v: Value) -> Result<Value, AppError> {
    Ok(v)
}

fn coerce_date(field: &str, v: Value) -> Result<Value, AppError> {
    let parsed = v.as_str().and_then(parse_datetime);
    match parsed {
        Some(dt) => Ok(Value::String(dt.to_rfc3339())),
        None => Err(AppError::Validation(format!("{} must be a date", field))),
    }
}

fn coerce_number(field: &str, v: Value) -> Result<Value, AppError> {
    match &v {
        Value::Number(_) => Ok(v),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::from(n));
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| AppError::Validation(format!("{} must be a number", field)))
        }
        _ => Err(AppError::Validation(format!("{} must be a number", field))),
    }
}

fn coerce_boolean(field: &str, v: Value) -> Result<Value, AppError> {
    let b = match &v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    b.map(Value::Bool)
        .ok_or_else(|| AppError::Validation(format!("{} must be a boolean", field)))
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (UTC), `YYYY-MM-DDTHH:MM:SS[.f]` (UTC) or `YYYY-MM-DD` (midnight UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
