// ABOUTME: SQL text for the token and client tables
// ABOUTME: Fixed DDL, insert, lookup, delete and expired-row sweep statements per table name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::TableName;
use crate::models::SubToken;
use std::fmt::Write;

/// Columns read back from the token table, in table order
pub const TOKEN_COLUMNS: &str = "id, code, code_created_at, code_expires_in, \
     access, access_created_at, access_expires_in, \
     refresh, refresh_created_at, refresh_expires_in, data";

/// Columns read back from the client table, in table order
pub const CLIENT_COLUMNS: &str = "id, secret, domain, data";

/// Statements issued by the token store, rendered once per table name
#[derive(Debug, Clone)]
pub(crate) struct TokenStatements {
    pub(crate) create_table: String,
    pub(crate) insert: String,
    pub(crate) collect_expired: String,
    select_by: [String; 3],
    delete_by: [String; 3],
}

impl TokenStatements {
    pub(crate) fn new(table: &TableName) -> Self {
        Self {
            create_table: token_table_ddl(table),
            insert: format!(
                "INSERT INTO {table} (code, code_created_at, code_expires_in, \
                 access, access_created_at, access_expires_in, \
                 refresh, refresh_created_at, refresh_expires_in, data) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
            ),
            collect_expired: collect_expired_sql(table),
            select_by: SubToken::ALL.map(|kind| {
                format!(
                    "SELECT {TOKEN_COLUMNS} FROM {table} WHERE {column} = $1 LIMIT 1",
                    column = kind.column()
                )
            }),
            delete_by: SubToken::ALL.map(|kind| {
                format!("DELETE FROM {table} WHERE {column} = $1", column = kind.column())
            }),
        }
    }

    pub(crate) fn select_by(&self, kind: SubToken) -> &str {
        &self.select_by[slot(kind)]
    }

    pub(crate) fn delete_by(&self, kind: SubToken) -> &str {
        &self.delete_by[slot(kind)]
    }
}

const fn slot(kind: SubToken) -> usize {
    match kind {
        SubToken::Code => 0,
        SubToken::Access => 1,
        SubToken::Refresh => 2,
    }
}

/// Statements issued by the client store
#[derive(Debug, Clone)]
pub(crate) struct ClientStatements {
    pub(crate) create_table: String,
    pub(crate) insert: String,
    pub(crate) select_by_id: String,
}

impl ClientStatements {
    pub(crate) fn new(table: &TableName) -> Self {
        Self {
            create_table: client_table_ddl(table),
            insert: format!(
                "INSERT INTO {table} (id, secret, domain, data) VALUES ($1, $2, $3, $4)"
            ),
            select_by_id: format!("SELECT {CLIENT_COLUMNS} FROM {table} WHERE id = $1 LIMIT 1"),
        }
    }
}

fn token_table_ddl(table: &TableName) -> String {
    let mut ddl = format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
  id                 BIGSERIAL   NOT NULL,
  code               TEXT        NOT NULL,
  code_created_at    TIMESTAMPTZ NOT NULL,
  code_expires_in    BIGINT      NOT NULL,
  access             TEXT        NOT NULL,
  access_created_at  TIMESTAMPTZ NOT NULL,
  access_expires_in  BIGINT      NOT NULL,
  refresh            TEXT        NOT NULL,
  refresh_created_at TIMESTAMPTZ NOT NULL,
  refresh_expires_in BIGINT      NOT NULL,
  data               JSONB       NOT NULL,
  CONSTRAINT {table}_pkey PRIMARY KEY (id)
);
"
    );
    for kind in SubToken::ALL {
        let column = kind.column();
        // Writing into a String cannot fail
        let _ = writeln!(
            ddl,
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ({column});"
        );
    }
    ddl
}

fn client_table_ddl(table: &TableName) -> String {
    format!(
        r"
CREATE TABLE IF NOT EXISTS {table} (
  id     TEXT  NOT NULL,
  secret TEXT  NOT NULL,
  domain TEXT  NOT NULL,
  data   JSONB NOT NULL,
  CONSTRAINT {table}_pkey PRIMARY KEY (id)
);
"
    )
}

/// One `DELETE` removing rows whose every issued sub-token has expired.
///
/// Expiry is judged against the database clock (`NOW()`) so that several store
/// instances with drifting clocks agree. Lifetimes are in milliseconds; a zero
/// lifetime is expired from the moment it was issued.
fn collect_expired_sql(table: &TableName) -> String {
    let conditions: Vec<String> = SubToken::ALL
        .iter()
        .map(|kind| {
            let value = kind.column();
            let created_at = kind.created_at_column();
            let expires_in = kind.expires_in_column();
            format!(
                "({value} = '' OR \
                 {created_at} + {expires_in} * INTERVAL '1 millisecond' <= NOW())"
            )
        })
        .collect();
    format!("DELETE FROM {table} WHERE {}", conditions.join(" AND "))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn table() -> TableName {
        TableName::new("tokens").unwrap()
    }

    #[test]
    fn ddl_creates_table_then_lookup_indexes() {
        let statements = TokenStatements::new(&table());
        let ddl = statements.create_table.trim_start();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS tokens ("));
        assert!(ddl.contains("CONSTRAINT tokens_pkey PRIMARY KEY (id)"));
        for column in ["code", "access", "refresh"] {
            assert!(ddl.contains(&format!(
                "CREATE INDEX IF NOT EXISTS idx_tokens_{column} ON tokens ({column});"
            )));
        }
    }

    #[test]
    fn lookups_select_every_column_by_one_key() {
        let statements = TokenStatements::new(&table());
        assert_eq!(
            statements.select_by(SubToken::Access),
            format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE access = $1 LIMIT 1")
        );
        assert_eq!(
            statements.delete_by(SubToken::Refresh),
            "DELETE FROM tokens WHERE refresh = $1"
        );
    }

    #[test]
    fn insert_binds_ten_values() {
        let statements = TokenStatements::new(&table());
        assert!(statements.insert.starts_with("INSERT INTO tokens (code, "));
        assert!(statements.insert.ends_with("$9, $10)"));
        assert!(!statements.insert.contains("$11"));
    }

    #[test]
    fn sweep_requires_every_sub_token_dead() {
        let sql = TokenStatements::new(&table()).collect_expired;
        assert_eq!(
            sql,
            "DELETE FROM tokens WHERE \
             (code = '' OR code_created_at + code_expires_in * INTERVAL '1 millisecond' <= NOW()) \
             AND (access = '' OR access_created_at + access_expires_in * INTERVAL '1 millisecond' <= NOW()) \
             AND (refresh = '' OR refresh_created_at + refresh_expires_in * INTERVAL '1 millisecond' <= NOW())"
        );
    }

    #[test]
    fn sweep_has_no_lifetime_exemptions() {
        let sql = TokenStatements::new(&table()).collect_expired;
        // A zero lifetime must fall through to the time comparison
        assert!(!sql.contains("> 0"));
        assert!(!sql.contains("INTERVAL '1 second'"));
        assert_eq!(sql.matches("<= NOW()").count(), 3);
        assert_eq!(sql.matches(" = ''").count(), 3);
    }

    #[test]
    fn client_statements() {
        let statements = ClientStatements::new(&TableName::new("clients").unwrap());
        assert!(statements
            .create_table
            .trim_start()
            .starts_with("CREATE TABLE IF NOT EXISTS clients ("));
        assert_eq!(
            statements.insert,
            "INSERT INTO clients (id, secret, domain, data) VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(
            statements.select_by_id,
            "SELECT id, secret, domain, data FROM clients WHERE id = $1 LIMIT 1"
        );
    }
}
