// ABOUTME: OAuth2 token record combining authorization code, access and refresh sub-tokens
// ABOUTME: Each sub-token carries its own creation time and lifetime for independent expiry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the three token kinds that can share a token row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubToken {
    /// Authorization code
    Code,
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

impl SubToken {
    /// All sub-token kinds in column order
    pub const ALL: [Self; 3] = [Self::Code, Self::Access, Self::Refresh];

    /// Column holding the sub-token value
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    /// Column holding the sub-token creation time
    #[must_use]
    pub const fn created_at_column(self) -> &'static str {
        match self {
            Self::Code => "code_created_at",
            Self::Access => "access_created_at",
            Self::Refresh => "refresh_created_at",
        }
    }

    /// Column holding the sub-token lifetime in milliseconds
    #[must_use]
    pub const fn expires_in_column(self) -> &'static str {
        match self {
            Self::Code => "code_expires_in",
            Self::Access => "access_expires_in",
            Self::Refresh => "refresh_expires_in",
        }
    }
}

impl fmt::Display for SubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Token information issued by the OAuth2 engine.
///
/// A single record may hold an authorization code, an access token and a
/// refresh token at once. Empty strings mean "not issued". Lifetimes are
/// stored as whole milliseconds, rounded up; a zero lifetime on an issued
/// sub-token means it is expired as soon as it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    /// Client the grant was issued to
    pub client_id: String,
    /// Resource owner
    pub user_id: String,
    /// Redirect URI used in the authorization request
    pub redirect_uri: String,
    /// Granted scope
    pub scope: String,

    /// Authorization code
    pub code: String,
    /// When the authorization code was issued
    pub code_created_at: Option<DateTime<Utc>>,
    /// Authorization code lifetime
    #[serde(with = "duration_millis")]
    pub code_expires_in: Duration,

    /// Access token
    pub access: String,
    /// When the access token was issued
    pub access_created_at: Option<DateTime<Utc>>,
    /// Access token lifetime
    #[serde(with = "duration_millis")]
    pub access_expires_in: Duration,

    /// Refresh token
    pub refresh: String,
    /// When the refresh token was issued
    pub refresh_created_at: Option<DateTime<Utc>>,
    /// Refresh token lifetime
    #[serde(with = "duration_millis")]
    pub refresh_expires_in: Duration,
}

impl Token {
    /// An empty token with no sub-tokens issued
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client and resource owner
    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self.user_id = user_id.into();
        self
    }

    /// Set the granted scope
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Issue an authorization code
    #[must_use]
    pub fn with_code(
        mut self,
        code: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> Self {
        self.code = code.into();
        self.code_created_at = Some(created_at);
        self.code_expires_in = expires_in;
        self
    }

    /// Issue an access token
    #[must_use]
    pub fn with_access(
        mut self,
        access: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> Self {
        self.access = access.into();
        self.access_created_at = Some(created_at);
        self.access_expires_in = expires_in;
        self
    }

    /// Issue a refresh token
    #[must_use]
    pub fn with_refresh(
        mut self,
        refresh: impl Into<String>,
        created_at: DateTime<Utc>,
        expires_in: Duration,
    ) -> Self {
        self.refresh = refresh.into();
        self.refresh_created_at = Some(created_at);
        self.refresh_expires_in = expires_in;
        self
    }

    /// Value of the given sub-token, empty when not issued
    #[must_use]
    pub fn value(&self, kind: SubToken) -> &str {
        match kind {
            SubToken::Code => &self.code,
            SubToken::Access => &self.access,
            SubToken::Refresh => &self.refresh,
        }
    }

    /// Creation time of the given sub-token
    #[must_use]
    pub const fn created_at(&self, kind: SubToken) -> Option<DateTime<Utc>> {
        match kind {
            SubToken::Code => self.code_created_at,
            SubToken::Access => self.access_created_at,
            SubToken::Refresh => self.refresh_created_at,
        }
    }

    /// Lifetime of the given sub-token
    #[must_use]
    pub const fn expires_in(&self, kind: SubToken) -> Duration {
        match kind {
            SubToken::Code => self.code_expires_in,
            SubToken::Access => self.access_expires_in,
            SubToken::Refresh => self.refresh_expires_in,
        }
    }

    /// When the given sub-token stops being valid.
    ///
    /// `None` if it was never issued. A zero lifetime expires at its creation
    /// time. A missing creation time counts from the Unix epoch, matching what
    /// the store writes to the table.
    #[must_use]
    pub fn expires_at(&self, kind: SubToken) -> Option<DateTime<Utc>> {
        if self.value(kind).is_empty() {
            return None;
        }
        let created_at = self.created_at(kind).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        ChronoDuration::from_std(self.expires_in(kind))
            .ok()
            .and_then(|lifetime| created_at.checked_add_signed(lifetime))
    }

    /// Whether the given sub-token is issued and still valid at `now`
    ///
    /// A lifetime too large to represent as a date never expires.
    #[must_use]
    pub fn is_live_at(&self, kind: SubToken, now: DateTime<Utc>) -> bool {
        if self.value(kind).is_empty() {
            return false;
        }
        self.expires_at(kind).is_none_or(|expires_at| expires_at > now)
    }

    /// Whether no sub-token is live at `now`, i.e. the row may be reclaimed
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !SubToken::ALL.iter().any(|&kind| self.is_live_at(kind, now))
    }
}

/// Lifetime in whole milliseconds, rounded up so a stored lifetime never ends
/// before the one it was built from
pub(crate) fn lifetime_millis(lifetime: Duration) -> u64 {
    let millis = lifetime.as_millis() + u128::from(lifetime.subsec_nanos() % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Serialize lifetimes as whole milliseconds
mod duration_millis {
    use super::lifetime_millis;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)] // serde's `with` signature
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(lifetime_millis(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
