// ABOUTME: PostgreSQL storage adapters on top of sqlx
// ABOUTME: Pooled and single-connection variants sharing positional binding and row decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{SqlRow, SqlValue, StorageAdapter};
use crate::errors::AdapterError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnection, PgPool, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Column, Connection, Executor, Row, TypeInfo};
use tokio::sync::Mutex;

/// Adapter over a shared `sqlx` connection pool
#[derive(Debug, Clone)]
pub struct PgPoolAdapter {
    pool: PgPool,
}

impl PgPoolAdapter {
    /// Wrap an existing pool; the pool stays owned by the caller's clones
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The wrapped pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StorageAdapter for PgPoolAdapter {
    async fn exec(&self, statement: &str, args: &[SqlValue]) -> Result<(), AdapterError> {
        if args.is_empty() {
            sqlx::raw_sql(statement).execute(&self.pool).await?;
        } else {
            bind_args(statement, args).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn select_one(&self, statement: &str, args: &[SqlValue]) -> Result<SqlRow, AdapterError> {
        let row = bind_args(statement, args)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AdapterError::NoRows)?;
        decode_row(&row)
    }
}

/// Adapter over one dedicated connection.
///
/// Statements are serialized on the connection, so concurrent store callers
/// and the GC task queue behind each other here.
#[derive(Debug)]
pub struct PgConnAdapter {
    conn: Mutex<PgConnection>,
}

impl PgConnAdapter {
    /// Wrap an open connection
    #[must_use]
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open a connection to `database_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the server is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self, AdapterError> {
        let conn = PgConnection::connect(database_url).await?;
        Ok(Self::new(conn))
    }

    /// Close the connection gracefully
    ///
    /// # Errors
    ///
    /// Returns an error if the terminate message cannot be sent.
    pub async fn close(self) -> Result<(), AdapterError> {
        self.conn.into_inner().close().await?;
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for PgConnAdapter {
    async fn exec(&self, statement: &str, args: &[SqlValue]) -> Result<(), AdapterError> {
        let mut conn = self.conn.lock().await;
        if args.is_empty() {
            conn.execute(sqlx::raw_sql(statement)).await?;
        } else {
            bind_args(statement, args).execute(&mut *conn).await?;
        }
        Ok(())
    }

    async fn select_one(&self, statement: &str, args: &[SqlValue]) -> Result<SqlRow, AdapterError> {
        let mut conn = self.conn.lock().await;
        let row = bind_args(statement, args)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(AdapterError::NoRows)?;
        decode_row(&row)
    }
}

fn bind_args<'q>(statement: &'q str, args: &[SqlValue]) -> Query<'q, Postgres, PgArguments> {
    args.iter().fold(sqlx::query(statement), |query, arg| match arg {
        SqlValue::Text(value) => query.bind(value.clone()),
        SqlValue::BigInt(value) => query.bind(*value),
        SqlValue::Timestamp(value) => query.bind(*value),
        SqlValue::Json(value) => query.bind(Json(value.clone())),
    })
}

fn decode_row(row: &PgRow) -> Result<SqlRow, AdapterError> {
    let mut decoded = SqlRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let value = match column.type_info().name() {
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                SqlValue::Text(row.try_get::<String, _>(index)?)
            }
            "INT8" => SqlValue::BigInt(row.try_get::<i64, _>(index)?),
            "INT4" => SqlValue::BigInt(i64::from(row.try_get::<i32, _>(index)?)),
            "INT2" => SqlValue::BigInt(i64::from(row.try_get::<i16, _>(index)?)),
            "TIMESTAMPTZ" => SqlValue::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?),
            "TIMESTAMP" => SqlValue::Timestamp(row.try_get::<NaiveDateTime, _>(index)?.and_utc()),
            "JSONB" | "JSON" => SqlValue::Json(row.try_get::<Value, _>(index)?),
            other => {
                return Err(AdapterError::decode(
                    column.name(),
                    format!("unsupported column type {other}"),
                ))
            }
        };
        decoded.push(column.name(), value);
    }
    Ok(decoded)
}
