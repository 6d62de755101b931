// ABOUTME: Storage adapter capability consumed by the token and client stores
// ABOUTME: Execute-statement and select-one-row over positional SQL values, with pluggable backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage Adapters
//!
//! The stores never talk to a database driver directly. They issue SQL through
//! [`StorageAdapter`], which has exactly two operations:
//!
//! - [`exec`](StorageAdapter::exec) runs a mutating statement;
//! - [`select_one`](StorageAdapter::select_one) returns the first row of a query,
//!   or [`AdapterError::NoRows`] when nothing matched.
//!
//! Arguments bind positionally to `$1..$n`. Rows come back as [`SqlRow`] and
//! destination records decode themselves through [`FromSqlRow`].

use crate::errors::AdapterError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// `PostgreSQL` adapters built on sqlx
#[cfg(feature = "postgresql")]
pub mod postgres;

/// Capability the stores are written against.
///
/// Implementations own their connection or pool. The stores share one adapter
/// between all callers and the GC task and never close it.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Execute a mutating statement
    ///
    /// A statement without arguments may contain several `;`-separated commands.
    async fn exec(&self, statement: &str, args: &[SqlValue]) -> Result<(), AdapterError>;

    /// Run a query and return its first row
    ///
    /// Returns [`AdapterError::NoRows`] when the query matched nothing.
    async fn select_one(&self, statement: &str, args: &[SqlValue]) -> Result<SqlRow, AdapterError>;
}

/// A positional argument or a column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// `TEXT`
    Text(String),
    /// `BIGINT` (narrower integer columns widen into it)
    BigInt(i64),
    /// `TIMESTAMPTZ`
    Timestamp(DateTime<Utc>),
    /// `JSONB`
    Json(Value),
}

impl SqlValue {
    /// Short type label used in decode errors
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::BigInt(_) => "bigint",
            Self::Timestamp(_) => "timestamptz",
            Self::Json(_) => "jsonb",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// A result row: named columns in query order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    /// An empty row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Raw value of `name`, if present
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Column names in query order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `TEXT` column
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Decode`] if the column is missing or not text.
    pub fn text(&self, name: &str) -> Result<&str, AdapterError> {
        match self.required(name)? {
            SqlValue::Text(value) => Ok(value),
            other => Err(mismatch(name, "text", other)),
        }
    }

    /// `BIGINT` column
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Decode`] if the column is missing or not an integer.
    pub fn big_int(&self, name: &str) -> Result<i64, AdapterError> {
        match self.required(name)? {
            SqlValue::BigInt(value) => Ok(*value),
            other => Err(mismatch(name, "bigint", other)),
        }
    }

    /// `TIMESTAMPTZ` column
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Decode`] if the column is missing or not a timestamp.
    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>, AdapterError> {
        match self.required(name)? {
            SqlValue::Timestamp(value) => Ok(*value),
            other => Err(mismatch(name, "timestamptz", other)),
        }
    }

    /// `JSONB` column
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Decode`] if the column is missing or not JSON.
    pub fn json(&self, name: &str) -> Result<&Value, AdapterError> {
        match self.required(name)? {
            SqlValue::Json(value) => Ok(value),
            other => Err(mismatch(name, "jsonb", other)),
        }
    }

    fn required(&self, name: &str) -> Result<&SqlValue, AdapterError> {
        self.get(name)
            .ok_or_else(|| AdapterError::decode(name, "column missing from result"))
    }
}

fn mismatch(name: &str, expected: &str, found: &SqlValue) -> AdapterError {
    AdapterError::decode(
        name,
        format!("expected {expected}, found {}", found.type_name()),
    )
}

/// A destination record that can be filled from a [`SqlRow`]
pub trait FromSqlRow: Sized {
    /// Decode the record
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Decode`] if a required column is missing or mistyped.
    fn from_sql_row(row: &SqlRow) -> Result<Self, AdapterError>;
}
