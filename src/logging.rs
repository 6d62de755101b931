// ABOUTME: Logger sink used by the token store's background GC loop
// ABOUTME: Default implementation forwards GC failures to tracing at error level
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use tracing::error;

/// Tracing target used for GC failure reports
pub const GC_LOG_TARGET: &str = "oauth2_pg_store::gc";

/// Sink for background failures that have no caller to return to.
///
/// The token store calls [`printf`](Self::printf) only when a GC pass fails;
/// nothing on the create/get/remove path ever reaches it.
pub trait ErrorLogger: Send + Sync {
    /// Record one preformatted message
    fn printf(&self, args: fmt::Arguments<'_>);
}

/// Default sink: emits each message as a `tracing` error event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl ErrorLogger for TracingLogger {
    fn printf(&self, args: fmt::Arguments<'_>) {
        error!(target: GC_LOG_TARGET, "{args}");
    }
}
