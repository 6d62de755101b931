// ABOUTME: Client store: OAuth2 client registrations keyed by client id
// ABOUTME: Table bootstrap, insert and lookup over a StorageAdapter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::schema::ClientStatements;
use super::Initialized;
use crate::config::{ClientStoreConfig, TableName};
use crate::database_plugins::{FromSqlRow, SqlRow, SqlValue, StorageAdapter};
use crate::errors::{AdapterError, StoreError, StoreResult};
use crate::models::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

struct ClientStoreItem {
    id: String,
    data: Value,
}

impl FromSqlRow for ClientStoreItem {
    fn from_sql_row(row: &SqlRow) -> Result<Self, AdapterError> {
        Ok(Self {
            id: row.text("id")?.to_owned(),
            data: row.json("data")?.clone(),
        })
    }
}

/// Durable client registrations over a [`StorageAdapter`]
pub struct ClientStore<A: StorageAdapter + ?Sized = dyn StorageAdapter> {
    adapter: Arc<A>,
    table_name: TableName,
    statements: ClientStatements,
}

impl<A> ClientStore<A>
where
    A: StorageAdapter + ?Sized,
{
    /// Build a store and create its table.
    ///
    /// As with the token store, a table creation failure is reported next to
    /// a usable store rather than instead of it.
    pub async fn new(adapter: Arc<A>, config: ClientStoreConfig) -> Initialized<Self> {
        let ClientStoreConfig {
            table_name,
            init_table_disabled,
            ..
        } = config;
        let statements = ClientStatements::new(&table_name);

        let init_error = if init_table_disabled {
            None
        } else {
            match adapter.exec(&statements.create_table, &[]).await {
                Ok(()) => {
                    info!(table = %table_name, "Client table ready");
                    None
                }
                Err(source) => {
                    warn!(table = %table_name, "Client table initialization failed: {source}");
                    Some(StoreError::StoreInit {
                        table: table_name.to_string(),
                        source,
                    })
                }
            }
        };

        let store = Self {
            adapter,
            table_name,
            statements,
        };
        Initialized::new(store, init_error)
    }

    /// Look up a client by id.
    ///
    /// An empty id returns `Ok(None)` without a query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no client has this id, [`StoreError::Storage`]
    /// if the query fails, or [`StoreError::Serialization`] on a malformed payload.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Client>> {
        if id.is_empty() {
            return Ok(None);
        }

        let row = self
            .adapter
            .select_one(&self.statements.select_by_id, &[SqlValue::from(id)])
            .await?;
        let item = ClientStoreItem::from_sql_row(&row)?;

        let mut client: Client = serde_json::from_value(item.data)?;
        if client.id.is_empty() {
            client.id = item.id;
        }
        Ok(Some(client))
    }

    /// Insert a client registration
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the insert fails, including when the
    /// id is already registered.
    pub async fn create(&self, client: &Client) -> StoreResult<()> {
        let data = serde_json::to_value(client)?;
        let args = [
            SqlValue::from(client.id.as_str()),
            SqlValue::from(client.secret.as_str()),
            SqlValue::from(client.domain.as_str()),
            SqlValue::Json(data),
        ];
        self.adapter.exec(&self.statements.insert, &args).await?;
        Ok(())
    }

    /// Table this store reads and writes
    #[must_use]
    pub const fn table_name(&self) -> &TableName {
        &self.table_name
    }
}
