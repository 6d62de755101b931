// ABOUTME: Token store: one table row per grant, looked up by code, access or refresh token
// ABOUTME: Insert, three lookup and removal paths, on-demand sweep, and GC lifecycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::gc::GcScheduler;
use super::schema::TokenStatements;
use super::Initialized;
use crate::config::{TableName, TokenStoreConfig};
use crate::database_plugins::{FromSqlRow, SqlRow, SqlValue, StorageAdapter};
use crate::errors::{AdapterError, StoreError, StoreResult};
use crate::models::token::lifetime_millis;
use crate::models::{SubToken, Token};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Destination record for token lookups
struct TokenStoreItem {
    id: i64,
    data: Value,
}

impl FromSqlRow for TokenStoreItem {
    fn from_sql_row(row: &SqlRow) -> Result<Self, AdapterError> {
        Ok(Self {
            id: row.big_int("id")?,
            data: row.json("data")?.clone(),
        })
    }
}

/// Durable token storage over a [`StorageAdapter`].
///
/// Every [`create`](Self::create) inserts a fresh row; nothing is upserted and
/// duplicate sub-token values are the caller's concern. Operations take `&self`
/// and may run concurrently: the store keeps no cached state, so all ordering
/// is whatever the database gives a single statement.
///
/// Unless disabled, a background task deletes rows whose issued sub-tokens have
/// all expired. Call [`close`](Self::close) to stop it deterministically.
pub struct TokenStore<A: StorageAdapter + ?Sized = dyn StorageAdapter> {
    adapter: Arc<A>,
    table_name: TableName,
    statements: TokenStatements,
    gc: Mutex<Option<GcScheduler>>,
}

impl<A> TokenStore<A>
where
    A: StorageAdapter + ?Sized + 'static,
{
    /// Build a store, create its table and start the GC loop.
    ///
    /// Table creation failure does not prevent construction: the store comes
    /// back together with a [`StoreError::StoreInit`] and the caller decides
    /// whether that is fatal. The GC loop is started either way unless
    /// disabled, and must run inside a tokio runtime.
    pub async fn new(adapter: Arc<A>, config: TokenStoreConfig) -> Initialized<Self> {
        let TokenStoreConfig {
            table_name,
            init_table_disabled,
            gc_disabled,
            gc_interval,
            logger,
        } = config;
        let statements = TokenStatements::new(&table_name);

        let init_error = if init_table_disabled {
            None
        } else {
            match adapter.exec(&statements.create_table, &[]).await {
                Ok(()) => {
                    info!(table = %table_name, "Token table ready");
                    None
                }
                Err(source) => {
                    warn!(table = %table_name, "Token table initialization failed: {source}");
                    Some(StoreError::StoreInit {
                        table: table_name.to_string(),
                        source,
                    })
                }
            }
        };

        let gc = (!gc_disabled).then(|| {
            GcScheduler::start(
                Arc::clone(&adapter),
                table_name.clone(),
                statements.collect_expired.clone(),
                gc_interval,
                logger,
            )
        });

        let store = Self {
            adapter,
            table_name,
            statements,
            gc: Mutex::new(gc),
        };
        Initialized::new(store, init_error)
    }

    /// Persist a token as a new row
    ///
    /// Unissued sub-tokens are written as empty strings, the Unix epoch and a
    /// zero lifetime, never as NULL. Lifetimes are written in milliseconds,
    /// rounded up.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the token cannot be encoded and
    /// [`StoreError::Storage`] if the insert fails.
    pub async fn create(&self, token: &Token) -> StoreResult<()> {
        let data = serde_json::to_value(token)?;

        let mut args = Vec::with_capacity(10);
        for kind in SubToken::ALL {
            args.push(SqlValue::from(token.value(kind)));
            args.push(SqlValue::Timestamp(
                token.created_at(kind).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            ));
            args.push(SqlValue::BigInt(column_millis(token.expires_in(kind))));
        }
        args.push(SqlValue::Json(data));

        self.adapter.exec(&self.statements.insert, &args).await?;
        Ok(())
    }

    /// Delete every row holding this authorization code
    ///
    /// An empty value is a no-op and issues no statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the delete fails. Matching nothing is not an error.
    pub async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        self.remove_by(SubToken::Code, code).await
    }

    /// Delete every row holding this access token
    ///
    /// An empty value is a no-op and issues no statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the delete fails. Matching nothing is not an error.
    pub async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.remove_by(SubToken::Access, access).await
    }

    /// Delete every row holding this refresh token
    ///
    /// An empty value is a no-op and issues no statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the delete fails. Matching nothing is not an error.
    pub async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.remove_by(SubToken::Refresh, refresh).await
    }

    /// Delete every row whose `kind` column equals `value`.
    ///
    /// An empty value is a no-op: it would otherwise match every row where that
    /// sub-token was never issued.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the delete fails.
    pub async fn remove_by(&self, kind: SubToken, value: &str) -> StoreResult<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.adapter
            .exec(self.statements.delete_by(kind), &[SqlValue::from(value)])
            .await?;
        Ok(())
    }

    /// Look up a token by authorization code
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row matches, or a storage error.
    pub async fn get_by_code(&self, code: &str) -> StoreResult<Option<Token>> {
        self.get_by(SubToken::Code, code).await
    }

    /// Look up a token by access token
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row matches, or a storage error.
    pub async fn get_by_access(&self, access: &str) -> StoreResult<Option<Token>> {
        self.get_by(SubToken::Access, access).await
    }

    /// Look up a token by refresh token
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row matches, or a storage error.
    pub async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Option<Token>> {
        self.get_by(SubToken::Refresh, refresh).await
    }

    /// Look up a token by one of its sub-token values.
    ///
    /// An empty value returns `Ok(None)` without touching the database. Any
    /// other miss is [`StoreError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no row matches, [`StoreError::Storage`]
    /// if the query fails, or [`StoreError::Serialization`] if the stored payload
    /// cannot be decoded.
    pub async fn get_by(&self, kind: SubToken, value: &str) -> StoreResult<Option<Token>> {
        if value.is_empty() {
            return Ok(None);
        }

        let row = self
            .adapter
            .select_one(self.statements.select_by(kind), &[SqlValue::from(value)])
            .await?;
        let item = TokenStoreItem::from_sql_row(&row)?;
        debug!(table = %self.table_name, id = item.id, lookup = %kind, "Token row found");

        Ok(Some(serde_json::from_value(item.data)?))
    }

    /// Run one GC pass now, outside the background schedule
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the delete fails.
    pub async fn collect_garbage(&self) -> StoreResult<()> {
        self.adapter
            .exec(&self.statements.collect_expired, &[])
            .await?;
        Ok(())
    }

    /// Stop the GC loop and wait for it to finish.
    ///
    /// Once this returns no GC statement will run again. Calling it more than
    /// once is harmless. The adapter is not closed; it belongs to the caller.
    pub async fn close(&self) {
        let scheduler = self
            .gc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(scheduler) = scheduler {
            scheduler.stop().await;
            info!(table = %self.table_name, "Token GC loop stopped");
        }
    }
}

impl<A> TokenStore<A>
where
    A: StorageAdapter + ?Sized,
{
    /// Whether the background GC loop is running
    #[must_use]
    pub fn is_gc_running(&self) -> bool {
        self.gc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|scheduler| !scheduler.is_finished())
    }

    /// Table this store reads and writes
    #[must_use]
    pub const fn table_name(&self) -> &TableName {
        &self.table_name
    }

    /// The shared adapter
    #[must_use]
    pub const fn adapter(&self) -> &Arc<A> {
        &self.adapter
    }
}

impl<A> fmt::Debug for TokenStore<A>
where
    A: StorageAdapter + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("table_name", &self.table_name)
            .field("gc_running", &self.is_gc_running())
            .finish_non_exhaustive()
    }
}

fn column_millis(lifetime: Duration) -> i64 {
    i64::try_from(lifetime_millis(lifetime)).unwrap_or(i64::MAX)
}
