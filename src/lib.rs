// ABOUTME: Main library entry point for PostgreSQL-backed OAuth2 token and client storage
// ABOUTME: Exposes the stores, the storage adapter capability, models, config and errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # OAuth2 PostgreSQL Store
//!
//! Durable storage for an `OAuth2` authorization server: issued tokens and
//! registered clients, kept in PostgreSQL tables.
//!
//! ## Features
//!
//! - **One row per grant**: authorization code, access token and refresh token
//!   share a row and each is a lookup key
//! - **Expiry reclamation**: a background loop deletes rows once every issued
//!   sub-token has expired
//! - **Pluggable execution**: stores talk to the database only through
//!   [`StorageAdapter`], with sqlx pool and single-connection adapters provided
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use oauth2_pg_store::{PgPoolAdapter, Token, TokenStore, TokenStoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/oauth2").await?;
//!     let adapter = Arc::new(PgPoolAdapter::new(pool));
//!
//!     let store = TokenStore::new(adapter, TokenStoreConfig::default())
//!         .await
//!         .into_result()?;
//!
//!     let token = Token::new()
//!         .with_client("client-1", "user-1")
//!         .with_access("access-abc", chrono::Utc::now(), Duration::from_secs(3600));
//!     store.create(&token).await?;
//!
//!     let found = store.get_by_access("access-abc").await?;
//!     assert_eq!(found, Some(token));
//!
//!     store.close().await;
//!     Ok(())
//! }
//! ```

/// Store configuration and environment loading
pub mod config;

/// Token and client stores
pub mod database;

/// Storage adapter capability and its PostgreSQL implementations
pub mod database_plugins;

/// Adapter and store error types
pub mod errors;

/// Logger sink for background failures
pub mod logging;

/// Token and client models
pub mod models;

pub use config::{ClientStoreConfig, ConfigError, TableName, TokenStoreConfig};
pub use database::{ClientStore, Initialized, TokenStore};
#[cfg(feature = "postgresql")]
pub use database_plugins::postgres::{PgConnAdapter, PgPoolAdapter};
pub use database_plugins::{FromSqlRow, SqlRow, SqlValue, StorageAdapter};
pub use errors::{AdapterError, StoreError, StoreResult};
pub use logging::{ErrorLogger, TracingLogger};
pub use models::{Client, SubToken, Token};
