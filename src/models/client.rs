// ABOUTME: Registered OAuth2 client model
// ABOUTME: Serialized whole into the client table's data column
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

/// An OAuth2 client registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Client {
    /// Client identifier, primary key of the client table
    pub id: String,
    /// Client secret
    pub secret: String,
    /// Registered redirect domain
    pub domain: String,
    /// Owner of the registration
    pub user_id: String,
}

impl Client {
    /// Build a client registration
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            user_id: user_id.into(),
        }
    }
}
