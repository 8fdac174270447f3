//! Field maps crossing the storage boundary
//!
//! [`Fields`] carries caller-supplied column values into a write and
//! [`Row`] carries a stored row back out. Both are JSON object maps keyed by
//! column name; this module is the only place that knows booleans sit on disk
//! as 0/1 and JSON payloads sit on disk as text.

use crate::record::Record;
use crate::relation::{Column, ColumnKind, Relation};
use crate::{Error, Result};
use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column values for an insert or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style setter
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// Build from a JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidRequest(format!(
                "expected an object of fields, got {}",
                other
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Validate every field against the relation's schema and convert it to
    /// its stored form. Column names in the result come from the static
    /// schema, never from the caller.
    pub(crate) fn to_sql(&self, relation: Relation) -> Result<Vec<(&'static str, SqlValue)>> {
        self.0
            .iter()
            .map(|(name, value)| {
                let column = relation.column(name).ok_or_else(|| Error::UnknownColumn {
                    relation,
                    column: name.clone(),
                })?;
                if !column.is_writable() {
                    return Err(invalid(column, "column is maintained by the store"));
                }
                Ok((column.name, to_sql_value(column, value)?))
            })
            .collect()
    }
}

fn invalid(column: &Column, reason: impl Into<String>) -> Error {
    Error::InvalidField {
        column: column.name.to_string(),
        reason: reason.into(),
    }
}

fn to_sql_value(column: &Column, value: &Value) -> Result<SqlValue> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }

    match column.kind {
        ColumnKind::Text => match (value, column.tokens) {
            (Value::String(text), Some(tokens)) if !tokens.contains(&text.as_str()) => Err(invalid(
                column,
                format!("expected one of {}, got '{}'", tokens.join("/"), text),
            )),
            (Value::String(text), _) => Ok(SqlValue::Text(text.clone())),
            // Free text keeps numbers and booleans in their written form
            (Value::Number(_) | Value::Bool(_), None) => Ok(SqlValue::Text(value.to_string())),
            (other, _) => Err(invalid(column, format!("expected text, got {}", other))),
        },
        ColumnKind::Integer => {
            let number = value
                .as_i64()
                .ok_or_else(|| invalid(column, format!("expected an integer, got {}", value)))?;
            if let Some((min, max)) = column.range {
                if number < min || number > max {
                    return Err(invalid(
                        column,
                        format!("{} is outside {}..={}", number, min, max),
                    ));
                }
            }
            Ok(SqlValue::Integer(number))
        }
        ColumnKind::Bool => match value {
            Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
            Value::Number(n) if matches!(n.as_i64(), Some(0 | 1)) => {
                Ok(SqlValue::Integer(n.as_i64().unwrap_or_default()))
            }
            other => Err(invalid(column, format!("expected a boolean, got {}", other))),
        },
        ColumnKind::Json => Ok(SqlValue::Text(serde_json::to_string(value)?)),
        ColumnKind::Id | ColumnKind::Timestamp => {
            Err(invalid(column, "column is maintained by the store"))
        }
    }
}

/// A stored row, keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    /// Decode a row selected with [`Relation::select_list`]
    pub(crate) fn from_sql(relation: Relation, row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let mut map = Map::new();
        for (idx, column) in relation.columns().iter().enumerate() {
            let value = match (column.kind, row.get_ref(idx)?) {
                (_, ValueRef::Null) => Value::Null,
                (ColumnKind::Bool, ValueRef::Integer(i)) => Value::Bool(i != 0),
                (ColumnKind::Json, ValueRef::Text(bytes)) => {
                    let text = String::from_utf8_lossy(bytes);
                    serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
                }
                (_, ValueRef::Integer(i)) => Value::from(i),
                (_, ValueRef::Real(f)) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                (_, ValueRef::Text(bytes)) => {
                    Value::String(String::from_utf8_lossy(bytes).into_owned())
                }
                (_, ValueRef::Blob(_)) => {
                    return Err(rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        Type::Blob,
                        format!("unexpected blob in {}.{}", relation, column.name).into(),
                    ));
                }
            };
            map.insert(column.name.to_string(), value);
        }
        Ok(Self(map))
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.0.get(column).and_then(Value::as_str)
    }

    /// Decode into the typed model of the relation
    pub fn into_record<T: Record>(self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.0))?)
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}
