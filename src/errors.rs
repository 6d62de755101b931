// ABOUTME: Error types for the OAuth2 token and client stores
// ABOUTME: Separates not-found, table initialization, and storage failures so callers can branch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Store Errors
//!
//! Two layers of errors live here:
//! - [`AdapterError`] is what a [`StorageAdapter`](crate::database_plugins::StorageAdapter)
//!   reports. Its `NoRows` variant is the distinguished "nothing matched" signal.
//! - [`StoreError`] is what the stores return to their callers. `NoRows` becomes
//!   [`StoreError::NotFound`]; every other adapter failure is passed through verbatim
//!   as [`StoreError::Storage`].

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Failure reported by a storage adapter
#[derive(Debug, Error)]
pub enum AdapterError {
    /// `select_one` matched no row
    #[error("no rows in result set")]
    NoRows,

    /// The driver rejected the statement or the connection failed
    #[error("database error: {0}")]
    Database(#[source] SqlxError),

    /// A result column was missing or held an unexpected type
    #[error("failed to decode column `{column}`: {reason}")]
    Decode {
        /// Column name as returned by the query
        column: String,
        /// What went wrong while decoding it
        reason: String,
    },
}

impl AdapterError {
    /// Build a decode error for `column`
    #[must_use]
    pub fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

impl From<SqlxError> for AdapterError {
    fn from(e: SqlxError) -> Self {
        match e {
            SqlxError::RowNotFound => Self::NoRows,
            other => Self::Database(other),
        }
    }
}

/// Error returned by [`TokenStore`](crate::database::TokenStore) and
/// [`ClientStore`](crate::database::ClientStore) operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Lookup by code, access, refresh or client id matched no row.
    ///
    /// Treat this as "revoked or expired": a concurrent GC pass may delete a row
    /// between a caller's create and its next read.
    #[error("record not found")]
    NotFound,

    /// The `CREATE TABLE IF NOT EXISTS` statement failed during construction
    #[error("failed to initialize table `{table}`: {source}")]
    StoreInit {
        /// Table the store was configured with
        table: String,
        /// Adapter failure behind it
        #[source]
        source: AdapterError,
    },

    /// Any other adapter failure during create, get or remove
    #[error("storage error: {0}")]
    Storage(#[source] AdapterError),

    /// The token or client payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this is the distinguished not-found outcome
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether this is a storage-class failure (adapter or payload encoding)
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialization(_))
    }

    /// Whether table initialization failed during construction
    #[must_use]
    pub const fn is_store_init(&self) -> bool {
        matches!(self, Self::StoreInit { .. })
    }
}

impl From<AdapterError> for StoreError {
    fn from(e: AdapterError) -> Self {
        match e {
            AdapterError::NoRows => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

/// Result alias used across the stores
pub type StoreResult<T> = Result<T, StoreError>;
