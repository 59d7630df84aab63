use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::PgRow;
use sqlx::types::BigDecimal;
use sqlx::{Column, Row, TypeInfo};
use tracing::debug;
use uuid::Uuid;

use crate::errors::DataAccessError;
use crate::models::candidate::RawRow;

/// Converts a driver row into a [`RawRow`], one entry per selected column.
///
/// Values keep the shape the driver delivers them in: numbers stay numbers,
/// arrays stay arrays, JSON stays structured. Types without a mapping are read
/// as text when the driver's type check allows it, otherwise they become null.
pub fn decode_row(row: &PgRow) -> Result<RawRow, DataAccessError> {
    let mut raw = RawRow::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let type_name = column.type_info().name();
        let value = decode_value(row, idx, type_name).map_err(|source| DataAccessError::Decode {
            column: column.name().to_string(),
            source,
        })?;
        raw.insert(column.name(), value);
    }
    Ok(raw)
}

fn decode_value(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    let value = match type_name {
        "BOOL" => opt(row.try_get::<Option<bool>, _>(idx)?, Value::Bool),
        "INT2" => opt(row.try_get::<Option<i16>, _>(idx)?, |v| Value::from(v)),
        "INT4" => opt(row.try_get::<Option<i32>, _>(idx)?, |v| Value::from(v)),
        "INT8" => opt(row.try_get::<Option<i64>, _>(idx)?, |v| Value::from(v)),
        "FLOAT4" => opt(row.try_get::<Option<f32>, _>(idx)?, |v| float(f64::from(v))),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(idx)?, float),
        "NUMERIC" => opt(row.try_get::<Option<BigDecimal>, _>(idx)?, decimal),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            opt(row.try_get::<Option<String>, _>(idx)?, Value::String)
        }
        "UUID" => opt(row.try_get::<Option<Uuid>, _>(idx)?, |v| {
            Value::String(v.to_string())
        }),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?.unwrap_or(Value::Null),
        "DATE" => opt(row.try_get::<Option<NaiveDate>, _>(idx)?, |v| {
            Value::String(v.to_string())
        }),
        "TIME" => opt(row.try_get::<Option<NaiveTime>, _>(idx)?, |v| {
            Value::String(v.to_string())
        }),
        "TIMESTAMP" => opt(row.try_get::<Option<NaiveDateTime>, _>(idx)?, |v| {
            Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        "TIMESTAMPTZ" => opt(row.try_get::<Option<DateTime<Utc>>, _>(idx)?, |v| {
            Value::String(v.to_rfc3339())
        }),
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            array(row.try_get::<Option<Vec<Option<String>>>, _>(idx)?, Value::String)
        }
        "INT2[]" => array(row.try_get::<Option<Vec<Option<i16>>>, _>(idx)?, |v| {
            Value::from(v)
        }),
        "INT4[]" => array(row.try_get::<Option<Vec<Option<i32>>>, _>(idx)?, |v| {
            Value::from(v)
        }),
        "INT8[]" => array(row.try_get::<Option<Vec<Option<i64>>>, _>(idx)?, |v| {
            Value::from(v)
        }),
        "FLOAT4[]" => array(row.try_get::<Option<Vec<Option<f32>>>, _>(idx)?, |v| {
            float(f64::from(v))
        }),
        "FLOAT8[]" => array(row.try_get::<Option<Vec<Option<f64>>>, _>(idx)?, float),
        "NUMERIC[]" => array(row.try_get::<Option<Vec<Option<BigDecimal>>>, _>(idx)?, decimal),
        "BOOL[]" => array(row.try_get::<Option<Vec<Option<bool>>>, _>(idx)?, Value::Bool),
        "JSONB[]" => array(row.try_get::<Option<Vec<Option<Value>>>, _>(idx)?, |v| v),
        other => text_or_null(row.try_get::<Option<String>, _>(idx), idx, other),
    };
    Ok(value)
}

/// Unmapped types only survive when the driver accepts them as text; a type
/// mismatch becomes null rather than a misread of the binary payload.
fn text_or_null(decoded: Result<Option<String>, sqlx::Error>, idx: usize, type_name: &str) -> Value {
    match decoded {
        Ok(text) => opt(text, Value::String),
        Err(e) => {
            debug!("Column {idx} has unsupported type {type_name}, reading as null: {e}");
            Value::Null
        }
    }
}

fn opt<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map(f).unwrap_or(Value::Null)
}

fn array<T>(value: Option<Vec<Option<T>>>, f: impl Fn(T) -> Value) -> Value {
    match value {
        Some(items) => Value::Array(items.into_iter().map(|item| opt(item, &f)).collect()),
        None => Value::Null,
    }
}

/// NaN and infinities have no JSON form.
fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn decimal(v: BigDecimal) -> Value {
    let text = v.to_string();
    match text.parse::<Number>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}
