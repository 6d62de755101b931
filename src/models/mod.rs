// ABOUTME: Domain payloads persisted by the stores
// ABOUTME: OAuth2 token records with three sub-tokens, and registered clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Registered OAuth2 clients
pub mod client;
/// Token records holding code, access and refresh sub-tokens
pub mod token;

pub use client::Client;
pub use token::{SubToken, Token};
