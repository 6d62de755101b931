// ABOUTME: Token and client stores built on the storage adapter capability
// ABOUTME: Owns table schema, the background GC loop, and the soft-fail construction result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Client registration store
pub mod clients;
/// Background collection of expired token rows
mod gc;
/// Table DDL and statement text
pub mod schema;
/// Token store with code, access and refresh lookups
pub mod tokens;

pub use clients::ClientStore;
pub use tokens::TokenStore;

use crate::errors::{StoreError, StoreResult};

/// A constructed store together with the outcome of its table bootstrap.
///
/// Construction never fails outright: if creating the table did not succeed
/// the store is still returned, fully usable against a table that may already
/// exist, and the failure is carried alongside it.
#[derive(Debug)]
#[must_use]
pub struct Initialized<S> {
    store: S,
    init_error: Option<StoreError>,
}

impl<S> Initialized<S> {
    pub(crate) const fn new(store: S, init_error: Option<StoreError>) -> Self {
        Self { store, init_error }
    }

    /// The store, regardless of how initialization went
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The table bootstrap failure, if there was one
    pub const fn init_error(&self) -> Option<&StoreError> {
        self.init_error.as_ref()
    }

    /// Split into the store and the optional bootstrap failure
    pub fn into_parts(self) -> (S, Option<StoreError>) {
        (self.store, self.init_error)
    }

    /// Treat a bootstrap failure as fatal.
    ///
    /// Dropping the store on error also drops its GC handle, which stops the
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError::StoreInit`] recorded during construction.
    pub fn into_result(self) -> StoreResult<S> {
        match self.init_error {
            Some(e) => Err(e),
            None => Ok(self.store),
        }
    }
}
