//! Column values and raw rows.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::RowError;

/// A single typed column value.
///
/// Rows read back from PostgreSQL arrive as JSON, so textual columns may
/// carry a UUID, timestamp or date; the typed accessors parse those forms too.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(v) => Some(*v),
            Value::Text(v) => Uuid::parse_str(v).ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => Some(*v),
            Value::Text(v) => DateTime::parse_from_rfc3339(v)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            Value::Text(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    /// Returns the value as JSON, converting scalar variants.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(v) => serde_json::Value::from(v.as_str()),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Bool(v) => serde_json::Value::from(*v),
            Value::Uuid(v) => serde_json::Value::from(v.to_string()),
            Value::Timestamp(v) => serde_json::Value::from(v.to_rfc3339()),
            Value::Date(v) => serde_json::Value::from(v.format("%Y-%m-%d").to_string()),
            Value::Json(v) => v.clone(),
        }
    }

    /// Converts a decoded JSON column into a value.
    ///
    /// Strings stay textual; arrays and objects stay JSON.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Bool(v),
            serde_json::Value::String(v) => Value::Text(v),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(v) => Value::Int(v),
                None => Value::Json(serde_json::Value::Number(n)),
            },
            other => Value::Json(other),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A raw row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Copies every column of `other` into this row, overwriting duplicates.
    pub fn merge(&mut self, other: &Row) {
        for (column, value) in other.columns() {
            self.columns.insert(column.to_string(), value.clone());
        }
    }

    /// Builds a row from a JSON object, as produced by `to_jsonb`.
    pub fn from_json(json: serde_json::Value) -> Result<Self, RowError> {
        match json {
            serde_json::Value::Object(map) => Ok(Self {
                columns: map
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            }),
            _ => Err(RowError::InvalidType {
                column: "<row>".to_string(),
                expected: "object",
            }),
        }
    }

    fn required<T>(
        &self,
        column: &str,
        expected: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<T, RowError> {
        let value = self
            .get(column)
            .ok_or_else(|| RowError::MissingColumn(column.to_string()))?;
        convert(value).ok_or_else(|| RowError::InvalidType {
            column: column.to_string(),
            expected,
        })
    }

    fn optional<T>(
        &self,
        column: &str,
        expected: &'static str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, RowError> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(value).map(Some).ok_or_else(|| RowError::InvalidType {
                column: column.to_string(),
                expected,
            }),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, RowError> {
        self.required(column, "text", |v| v.as_text().map(str::to_string))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>, RowError> {
        self.optional(column, "text", |v| v.as_text().map(str::to_string))
    }

    pub fn int(&self, column: &str) -> Result<i64, RowError> {
        self.required(column, "integer", Value::as_int)
    }

    pub fn opt_int(&self, column: &str) -> Result<Option<i64>, RowError> {
        self.optional(column, "integer", Value::as_int)
    }

    /// Reads an integer column that must fit in 32 bits.
    pub fn int32(&self, column: &str) -> Result<i32, RowError> {
        self.required(column, "32-bit integer", |v| {
            v.as_int().and_then(|i| i32::try_from(i).ok())
        })
    }

    pub fn opt_int32(&self, column: &str) -> Result<Option<i32>, RowError> {
        self.optional(column, "32-bit integer", |v| {
            v.as_int().and_then(|i| i32::try_from(i).ok())
        })
    }

    pub fn boolean(&self, column: &str) -> Result<bool, RowError> {
        self.required(column, "boolean", Value::as_bool)
    }

    pub fn uuid(&self, column: &str) -> Result<Uuid, RowError> {
        self.required(column, "uuid", Value::as_uuid)
    }

    pub fn opt_uuid(&self, column: &str) -> Result<Option<Uuid>, RowError> {
        self.optional(column, "uuid", Value::as_uuid)
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, RowError> {
        self.required(column, "timestamp", Value::as_timestamp)
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, RowError> {
        self.required(column, "date", Value::as_date)
    }

    pub fn opt_date(&self, column: &str) -> Result<Option<NaiveDate>, RowError> {
        self.optional(column, "date", Value::as_date)
    }

    pub fn opt_json(&self, column: &str) -> Result<Option<serde_json::Value>, RowError> {
        self.optional(column, "json", |v| match v {
            Value::Json(json) => Some(json.clone()),
            _ => None,
        })
    }
}
