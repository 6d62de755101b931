// ABOUTME: Background reclamation of expired token rows
// ABOUTME: Owned tokio task ticking at a fixed interval, stopped and joined by TokenStore::close
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::{TableName, MIN_GC_INTERVAL};
use crate::database_plugins::StorageAdapter;
use crate::logging::ErrorLogger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Handle to a running GC loop.
///
/// Dropping the handle closes the shutdown channel, so the loop exits on its
/// next wake-up even if nobody joins it. [`stop`](Self::stop) additionally
/// waits for the task, including any sweep already in flight.
pub(crate) struct GcScheduler {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl GcScheduler {
    /// Spawn the loop on the current tokio runtime
    pub(crate) fn start<A>(
        adapter: Arc<A>,
        table: TableName,
        statement: String,
        interval: Duration,
        logger: Arc<dyn ErrorLogger>,
    ) -> Self
    where
        A: StorageAdapter + ?Sized + 'static,
    {
        let period = if interval < MIN_GC_INTERVAL {
            warn!(
                table = %table,
                requested_ms = interval.as_millis(),
                "GC interval below minimum, using {}s",
                MIN_GC_INTERVAL.as_secs()
            );
            MIN_GC_INTERVAL
        } else {
            interval
        };

        info!(table = %table, interval_secs = period.as_secs(), "Starting token GC loop");

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = GcTask {
            adapter,
            table,
            statement,
            period,
            logger,
        };
        let handle = tokio::spawn(task.run(shutdown_rx));

        Self { shutdown, handle }
    }

    /// Signal the loop and wait until it has exited
    pub(crate) async fn stop(self) {
        let Self { shutdown, handle } = self;
        drop(shutdown);
        if let Err(e) = handle.await {
            warn!("Token GC task ended abnormally: {e}");
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

struct GcTask<A: ?Sized> {
    adapter: Arc<A>,
    table: TableName,
    statement: String,
    period: Duration,
    logger: Arc<dyn ErrorLogger>,
}

impl<A> GcTask<A>
where
    A: StorageAdapter + ?Sized,
{
    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        // First pass one full period after start, not immediately
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            // Not raced against shutdown: a started sweep always runs to completion
            match self.adapter.exec(&self.statement, &[]).await {
                Ok(()) => debug!(table = %self.table, "Expired token sweep completed"),
                Err(e) => self.logger.printf(format_args!(
                    "failed to delete expired tokens from {}: {e}",
                    self.table
                )),
            }
        }

        debug!(table = %self.table, "Token GC loop stopped");
    }
}
