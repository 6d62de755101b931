// ABOUTME: Shared test utilities for the store integration tests
// ABOUTME: In-memory storage adapter with a controllable clock, a capturing logger, and log setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::wildcard_in_or_patterns,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `oauth2_pg_store`
//!
//! [`MemoryAdapter`] understands exactly the statements the stores issue, so
//! store behavior can be checked without a database. It follows `PostgreSQL`
//! semantics where the stores depend on them: missing tables are errors, the
//! client primary key is unique, and the expired-row sweep uses the adapter's
//! own clock in place of `NOW()`.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use oauth2_pg_store::{AdapterError, ErrorLogger, SqlRow, SqlValue, StorageAdapter, SubToken};
use sqlx::Error as SqlxError;
use std::{
    collections::HashMap,
    env, fmt,
    sync::{Mutex, Once},
    time::Duration,
};
use tokio::time::sleep;
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize tracing for tests, level from `TEST_LOG` (default WARN)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            Ok("WARN" | "ERROR") | _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Whether a statement is the expired-row sweep
pub fn is_sweep(statement: &str) -> bool {
    statement.trim_start().starts_with("DELETE FROM") && statement.contains("NOW()")
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Vec<SqlRow>>,
    statements: Vec<String>,
    next_id: i64,
    now: DateTime<Utc>,
    failing: bool,
    sweep_delay: Option<Duration>,
    completed_sweeps: usize,
}

/// In-memory [`StorageAdapter`]
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                now: Utc::now(),
                ..MemoryState::default()
            }),
        }
    }

    /// Current adapter clock, the stand-in for `NOW()`
    pub fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().now
    }

    pub fn advance_clock(&self, by: ChronoDuration) {
        let mut state = self.state.lock().unwrap();
        state.now += by;
    }

    /// Make every following statement fail with a pool timeout
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Hold each sweep for `delay` before applying it
    pub fn set_sweep_delay(&self, delay: Duration) {
        self.state.lock().unwrap().sweep_delay = Some(delay);
    }

    /// Create a table as if it already existed in the database
    pub fn create_table(&self, table: &str) {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table.to_owned())
            .or_default();
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().unwrap().tables.contains_key(table)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .map_or(0, Vec::len)
    }

    /// Every statement received, in order, including failed ones
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn count_statements(&self, predicate: impl Fn(&str) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .statements
            .iter()
            .filter(|s| predicate(s))
            .count()
    }

    /// Sweeps started, whether or not they succeeded
    pub fn sweep_count(&self) -> usize {
        self.count_statements(is_sweep)
    }

    /// Sweeps applied to the data
    pub fn completed_sweeps(&self) -> usize {
        self.state.lock().unwrap().completed_sweeps
    }

    pub fn clear_statements(&self) {
        self.state.lock().unwrap().statements.clear();
    }

    fn record(&self, statement: &str) -> Result<Option<Duration>, AdapterError> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.to_owned());
        if state.failing {
            return Err(AdapterError::Database(SqlxError::PoolTimedOut));
        }
        Ok(state.sweep_delay.filter(|_| is_sweep(statement)))
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn exec(&self, statement: &str, args: &[SqlValue]) -> Result<(), AdapterError> {
        if let Some(delay) = self.record(statement)? {
            sleep(delay).await;
        }
        self.state.lock().unwrap().apply(statement, args)
    }

    async fn select_one(&self, statement: &str, args: &[SqlValue]) -> Result<SqlRow, AdapterError> {
        self.record(statement)?;
        self.state.lock().unwrap().select(statement, args)
    }
}

impl MemoryState {
    fn table_mut(&mut self, table: &str) -> Result<&mut Vec<SqlRow>, AdapterError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| missing_relation(table))
    }

    fn apply(&mut self, statement: &str, args: &[SqlValue]) -> Result<(), AdapterError> {
        let sql = statement.trim();

        if let Some(rest) = sql.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
            self.tables.entry(first_word(rest)).or_default();
            return Ok(());
        }

        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let table = first_word(rest);
            let open = rest.find('(').unwrap();
            let close = rest.find(')').unwrap();
            let columns: Vec<&str> = rest[open + 1..close].split(',').map(str::trim).collect();
            assert_eq!(columns.len(), args.len(), "argument count for {sql}");

            let explicit_id = columns.contains(&"id");
            let mut row = SqlRow::new();
            if !explicit_id {
                self.next_id += 1;
                row.push("id", self.next_id);
            }
            for (column, value) in columns.iter().zip(args) {
                row.push(*column, value.clone());
            }

            let rows = self.table_mut(&table)?;
            if explicit_id && rows.iter().any(|r| r.get("id") == row.get("id")) {
                return Err(AdapterError::Database(SqlxError::Protocol(format!(
                    "duplicate key value violates unique constraint \"{table}_pkey\""
                ))));
            }
            rows.push(row);
            return Ok(());
        }

        if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let table = first_word(rest);
            if sql.contains("NOW()") {
                assert_eq!(
                    sql.matches("INTERVAL '1 millisecond' <= NOW()").count(),
                    3,
                    "sweep no longer matches the emulated condition: {sql}"
                );
                let now = self.now;
                self.table_mut(&table)?
                    .retain(|row| !fully_expired(row, now));
                self.completed_sweeps += 1;
            } else {
                let column = where_column(rest);
                let value = &args[0];
                self.table_mut(&table)?
                    .retain(|row| row.get(&column) != Some(value));
            }
            return Ok(());
        }

        panic!("unsupported statement: {sql}");
    }

    fn select(&self, statement: &str, args: &[SqlValue]) -> Result<SqlRow, AdapterError> {
        let sql = statement.trim();
        assert!(sql.starts_with("SELECT "), "unsupported query: {sql}");
        let (_, rest) = sql.split_once(" FROM ").unwrap();
        let table = first_word(rest);
        let column = where_column(rest);
        let value = &args[0];

        self.tables
            .get(&table)
            .ok_or_else(|| missing_relation(&table))?
            .iter()
            .find(|row| row.get(&column) == Some(value))
            .cloned()
            .ok_or(AdapterError::NoRows)
    }
}

fn missing_relation(table: &str) -> AdapterError {
    AdapterError::Database(SqlxError::Protocol(format!(
        "relation \"{table}\" does not exist"
    )))
}

fn first_word(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap()
        .to_owned()
}

fn where_column(s: &str) -> String {
    let (_, condition) = s.split_once("WHERE ").unwrap();
    first_word(condition)
}

fn fully_expired(row: &SqlRow, now: DateTime<Utc>) -> bool {
    SubToken::ALL.iter().all(|kind| {
        if row.text(kind.column()).unwrap().is_empty() {
            return true;
        }
        let expires_in = row.big_int(kind.expires_in_column()).unwrap();
        let created_at = row.timestamp(kind.created_at_column()).unwrap();
        created_at + ChronoDuration::milliseconds(expires_in) <= now
    })
}

/// Logger capturing every message
#[derive(Default)]
pub struct MemoryLogger {
    messages: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ErrorLogger for MemoryLogger {
    fn printf(&self, args: fmt::Arguments<'_>) {
        self.messages.lock().unwrap().push(args.to_string());
    }
}
