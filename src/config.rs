// ABOUTME: Construction-time configuration for the token and client stores
// ABOUTME: Table names, table bootstrap and GC switches, with environment-variable loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Store Configuration
//!
//! Configuration is environment-only, read once when a store is built. Every
//! option also has a builder method so callers can configure stores in code:
//!
//! | Variable                              | Meaning                          |
//! |---------------------------------------|----------------------------------|
//! | `OAUTH2_TOKEN_TABLE`                  | token table name                 |
//! | `OAUTH2_TOKEN_INIT_TABLE_DISABLED`    | skip `CREATE TABLE IF NOT EXISTS`|
//! | `OAUTH2_TOKEN_GC_DISABLED`            | do not start the GC loop         |
//! | `OAUTH2_TOKEN_GC_INTERVAL_SECS`       | seconds between GC passes        |
//! | `OAUTH2_CLIENT_TABLE`                 | client table name                |
//! | `OAUTH2_CLIENT_INIT_TABLE_DISABLED`   | skip `CREATE TABLE IF NOT EXISTS`|

use crate::logging::{ErrorLogger, TracingLogger};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Default token table name
pub const DEFAULT_TOKEN_TABLE: &str = "oauth2_tokens";

/// Default client table name
pub const DEFAULT_CLIENT_TABLE: &str = "oauth2_clients";

/// Default delay between GC passes (10 minutes)
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(600);

/// Shortest GC period the scheduler will run with; smaller values are raised to it
pub const MIN_GC_INTERVAL: Duration = Duration::from_secs(1);

/// Longest accepted table name. Index names derived from it must fit in 63 bytes.
pub const MAX_TABLE_NAME_LEN: usize = 48;

/// Environment variable overriding the token table name
pub const TOKEN_TABLE_ENV: &str = "OAUTH2_TOKEN_TABLE";
/// Environment variable disabling token table creation
pub const TOKEN_INIT_TABLE_DISABLED_ENV: &str = "OAUTH2_TOKEN_INIT_TABLE_DISABLED";
/// Environment variable disabling the GC loop
pub const TOKEN_GC_DISABLED_ENV: &str = "OAUTH2_TOKEN_GC_DISABLED";
/// Environment variable overriding the GC interval, in seconds
pub const TOKEN_GC_INTERVAL_ENV: &str = "OAUTH2_TOKEN_GC_INTERVAL_SECS";
/// Environment variable overriding the client table name
pub const CLIENT_TABLE_ENV: &str = "OAUTH2_CLIENT_TABLE";
/// Environment variable disabling client table creation
pub const CLIENT_INIT_TABLE_DISABLED_ENV: &str = "OAUTH2_CLIENT_INIT_TABLE_DISABLED";

/// Invalid store configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Table names are interpolated into SQL and must be plain identifiers
    #[error(
        "invalid table name `{0}`: expected [A-Za-z_][A-Za-z0-9_]* of at most {MAX_TABLE_NAME_LEN} bytes"
    )]
    InvalidTableName(String),

    /// An environment variable held a value that could not be parsed
    #[error("environment variable {name} has invalid value `{value}`")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Raw value found in the environment
        value: String,
    },
}

/// A validated SQL table identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validate `name` as an unquoted SQL identifier
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTableName`] if the name is empty, longer than
    /// [`MAX_TABLE_NAME_LEN`], or contains anything other than ASCII letters,
    /// digits and underscores (or starts with a digit).
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(ConfigError::InvalidTableName(name))
        }
    }

    /// The identifier as it appears in SQL
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        name.len() <= MAX_TABLE_NAME_LEN
            && (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for TableName {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Token store configuration
#[derive(Clone)]
pub struct TokenStoreConfig {
    /// Table holding token rows
    pub table_name: TableName,
    /// Skip the `CREATE TABLE IF NOT EXISTS` statement on construction
    pub init_table_disabled: bool,
    /// Do not start the background GC loop
    pub gc_disabled: bool,
    /// Delay between GC passes
    pub gc_interval: Duration,
    /// Sink for GC failures
    pub logger: Arc<dyn ErrorLogger>,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            table_name: TableName(DEFAULT_TOKEN_TABLE.to_owned()),
            init_table_disabled: false,
            gc_disabled: false,
            gc_interval: DEFAULT_GC_INTERVAL,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for TokenStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStoreConfig")
            .field("table_name", &self.table_name)
            .field("init_table_disabled", &self.init_table_disabled)
            .field("gc_disabled", &self.gc_disabled)
            .field("gc_interval", &self.gc_interval)
            .finish_non_exhaustive()
    }
}

impl TokenStoreConfig {
    /// Load overrides from the environment on top of the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a table name is invalid or a boolean/interval
    /// variable cannot be parsed. A GC interval of zero is rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = env_var(TOKEN_TABLE_ENV) {
            config.table_name = TableName::new(name)?;
        }
        if let Some(value) = env_var(TOKEN_INIT_TABLE_DISABLED_ENV) {
            config.init_table_disabled = parse_bool(TOKEN_INIT_TABLE_DISABLED_ENV, value)?;
        }
        if let Some(value) = env_var(TOKEN_GC_DISABLED_ENV) {
            config.gc_disabled = parse_bool(TOKEN_GC_DISABLED_ENV, value)?;
        }
        if let Some(value) = env_var(TOKEN_GC_INTERVAL_ENV) {
            config.gc_interval = parse_interval_secs(TOKEN_GC_INTERVAL_ENV, value)?;
        }

        Ok(config)
    }

    /// Use `table_name` instead of [`DEFAULT_TOKEN_TABLE`]
    #[must_use]
    pub fn with_table_name(mut self, table_name: TableName) -> Self {
        self.table_name = table_name;
        self
    }

    /// Skip table creation (the table must already exist)
    #[must_use]
    pub const fn with_init_table_disabled(mut self) -> Self {
        self.init_table_disabled = true;
        self
    }

    /// Do not run the background GC loop
    #[must_use]
    pub const fn with_gc_disabled(mut self) -> Self {
        self.gc_disabled = true;
        self
    }

    /// Run a GC pass every `interval`
    #[must_use]
    pub const fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Report GC failures to `logger`
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }
}

/// Client store configuration
#[derive(Clone)]
pub struct ClientStoreConfig {
    /// Table holding client rows
    pub table_name: TableName,
    /// Skip the `CREATE TABLE IF NOT EXISTS` statement on construction
    pub init_table_disabled: bool,
    /// Accepted for parity with [`TokenStoreConfig`]; the client store runs no
    /// background work, so nothing is ever reported to it
    pub logger: Arc<dyn ErrorLogger>,
}

impl Default for ClientStoreConfig {
    fn default() -> Self {
        Self {
            table_name: TableName(DEFAULT_CLIENT_TABLE.to_owned()),
            init_table_disabled: false,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl fmt::Debug for ClientStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientStoreConfig")
            .field("table_name", &self.table_name)
            .field("init_table_disabled", &self.init_table_disabled)
            .finish_non_exhaustive()
    }
}

impl ClientStoreConfig {
    /// Load overrides from the environment on top of the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the table name is invalid or the boolean cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = env_var(CLIENT_TABLE_ENV) {
            config.table_name = TableName::new(name)?;
        }
        if let Some(value) = env_var(CLIENT_INIT_TABLE_DISABLED_ENV) {
            config.init_table_disabled = parse_bool(CLIENT_INIT_TABLE_DISABLED_ENV, value)?;
        }

        Ok(config)
    }

    /// Use `table_name` instead of [`DEFAULT_CLIENT_TABLE`]
    #[must_use]
    pub fn with_table_name(mut self, table_name: TableName) -> Self {
        self.table_name = table_name;
        self
    }

    /// Skip table creation (the table must already exist)
    #[must_use]
    pub const fn with_init_table_disabled(mut self) -> Self {
        self.init_table_disabled = true;
        self
    }

    /// Replace the logger sink
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { name, value }),
    }
}

fn parse_interval_secs(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidEnv { name, value }),
    }
}
