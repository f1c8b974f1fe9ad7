//! Pool Health Supervision
//!
//! A background pool error is unrecoverable for the process, but the code that
//! notices it (a pool hook) is the wrong place to end the process. Observers
//! raise a [`FatalSignal`] instead, and the top-level orchestrator waits on the
//! matching [`HealthMonitor`] through [`supervise`], which decides how the
//! process ends.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Exit status used when the pool reports a fatal error.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Health of the shared pool as seen by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolHealth {
    Healthy,
    Failed(String),
}

impl PoolHealth {
    pub fn is_failed(&self) -> bool {
        matches!(self, PoolHealth::Failed(_))
    }
}

/// Sending half: raised by observers when the pool hits an unrecoverable error.
#[derive(Debug, Clone)]
pub struct FatalSignal {
    tx: Arc<watch::Sender<PoolHealth>>,
}

/// Receiving half, held by the orchestrator.
#[derive(Debug)]
pub struct HealthMonitor {
    rx: watch::Receiver<PoolHealth>,
}

impl FatalSignal {
    /// Creates a connected signal/monitor pair starting out healthy.
    pub fn channel() -> (FatalSignal, HealthMonitor) {
        let (tx, rx) = watch::channel(PoolHealth::Healthy);
        (FatalSignal { tx: Arc::new(tx) }, HealthMonitor { rx })
    }

    /// Marks the pool as failed. The first reason is kept; later calls are
    /// ignored.
    pub fn trigger(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.tx.send_if_modified(|health| {
            if health.is_failed() {
                return false;
            }
            *health = PoolHealth::Failed(reason);
            true
        });
    }
}

impl HealthMonitor {
    /// Current health without waiting.
    pub fn health(&self) -> PoolHealth {
        self.rx.borrow().clone()
    }

    /// Resolves with the failure reason once the pool has failed.
    ///
    /// Never resolves if every [`FatalSignal`] is dropped while still healthy.
    pub async fn failed(&mut self) -> String {
        let reason = match self.rx.wait_for(PoolHealth::is_failed).await {
            Ok(health) => match &*health {
                PoolHealth::Failed(reason) => Some(reason.clone()),
                PoolHealth::Healthy => None,
            },
            Err(_) => None,
        };

        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}

/// How the process should end once the pool has failed.
pub trait ExitHook {
    fn exit(&self, code: i32);
}

/// Production [`ExitHook`] that terminates the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl ExitHook for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }
}

/// Why [`supervise`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    /// The shutdown future completed first.
    Requested,
    /// The pool failed; the exit hook has already been called.
    Fatal(String),
}

/// Waits for either an orderly shutdown request or a fatal pool error.
///
/// On a fatal error the reason is logged and `exit` is invoked with
/// [`FATAL_EXIT_CODE`], abandoning any in-flight work. With [`ProcessExit`]
/// this function does not return in that case.
///
/// # Arguments
///
/// * `monitor` - The health monitor paired with the observers' [`FatalSignal`]
/// * `shutdown` - Completes when the process is asked to stop (e.g. Ctrl-C)
/// * `exit` - What to do on a fatal error
pub async fn supervise<F>(
    mut monitor: HealthMonitor,
    shutdown: F,
    exit: &dyn ExitHook,
) -> Shutdown
where
    F: Future<Output = ()>,
{
    tokio::select! {
        reason = monitor.failed() => {
            tracing::error!(%reason, exit_code = FATAL_EXIT_CODE, "database pool failed, terminating");
            exit.exit(FATAL_EXIT_CODE);
            Shutdown::Fatal(reason)
        }
        () = shutdown => {
            tracing::info!("shutdown requested");
            Shutdown::Requested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExit {
        codes: Mutex<Vec<i32>>,
    }

    impl ExitHook for RecordingExit {
        fn exit(&self, code: i32) {
            self.codes.lock().unwrap().push(code);
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let (signal, monitor) = FatalSignal::channel();
        assert_eq!(monitor.health(), PoolHealth::Healthy);

        signal.trigger("connection reset");
        signal.trigger("second error");

        assert_eq!(
            monitor.health(),
            PoolHealth::Failed("connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn test_fatal_signal_calls_exit_hook() {
        let (signal, monitor) = FatalSignal::channel();
        let exit = RecordingExit::default();

        signal.trigger("terminating connection due to administrator command");
        let outcome = supervise(monitor, std::future::pending(), &exit).await;

        assert_eq!(
            outcome,
            Shutdown::Fatal("terminating connection due to administrator command".to_string())
        );
        assert_eq!(*exit.codes.lock().unwrap(), vec![FATAL_EXIT_CODE]);
        assert_ne!(FATAL_EXIT_CODE, 0);
    }

    #[tokio::test]
    async fn test_signal_from_another_task() {
        let (signal, monitor) = FatalSignal::channel();
        let exit = RecordingExit::default();

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            signal.trigger("idle connection dropped");
        });
        let outcome = supervise(monitor, std::future::pending(), &exit).await;

        assert!(matches!(outcome, Shutdown::Fatal(_)));
        assert_eq!(exit.codes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_requested_shutdown_does_not_exit() {
        let (_signal, monitor) = FatalSignal::channel();
        let exit = RecordingExit::default();

        let outcome = supervise(monitor, async {}, &exit).await;

        assert_eq!(outcome, Shutdown::Requested);
        assert!(exit.codes.lock().unwrap().is_empty());
    }
}
