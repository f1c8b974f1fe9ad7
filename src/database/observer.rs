//! Pool Lifecycle Observers
//!
//! Observers are invoked from the pool's connection hooks:
//!
//! - `on_connect` once per newly established physical connection
//! - `on_error` for a background error on an idle connection, such as a
//!   connection the server dropped while it sat in the pool
//!
//! Both run inside the pool's own tasks and must return quickly.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::database::supervisor::FatalSignal;

/// Receives lifecycle events from the shared pool.
pub trait PoolObserver: Send + Sync + 'static {
    /// A new connection to the server was established.
    fn on_connect(&self);

    /// The pool hit an error outside of any caller's query.
    fn on_error(&self, error: &sqlx::Error);
}

/// Default observer: logs every event and treats any background error as fatal.
#[derive(Debug)]
pub struct LoggingObserver {
    fatal: FatalSignal,
    connections: AtomicU64,
    errors: AtomicU64,
}

impl LoggingObserver {
    pub fn new(fatal: FatalSignal) -> Self {
        Self {
            fatal,
            connections: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Number of connect events seen so far.
    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    /// Number of error events seen so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl PoolObserver for LoggingObserver {
    fn on_connect(&self) {
        let total = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(connections = total, "database connected successfully");
    }

    fn on_error(&self, error: &sqlx::Error) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        tracing::error!(%error, "unexpected database error");
        self.fatal.trigger(error.to_string());
    }
}
