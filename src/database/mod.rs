//! Database Pool Provider
//!
//! This module builds the single PostgreSQL connection pool shared by the
//! whole application and reports its lifecycle events.
//!
//! ## Overview
//!
//! Data flows in one direction:
//!
//! `DB_*` environment → [`ConnectionSettings`] → [`Database`] (sqlx pool with
//! connect/error hooks) → handle cloned into every consumer
//!
//! Background pool errors are fatal for the process. Observers do not exit on
//! their own; they raise a [`FatalSignal`] and the binary's orchestrator ends
//! the process through [`supervise`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hrms_db::database::{ConnectionSettings, Database, FatalSignal, LoggingObserver};
//! use hrms_db::database::supervisor::{ProcessExit, supervise};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = ConnectionSettings::from_env()?;
//! let (fatal, monitor) = FatalSignal::channel();
//! let database = Database::connect_lazy(&settings, Arc::new(LoggingObserver::new(fatal)))?;
//!
//! // hand `database.clone()` to request handlers...
//!
//! supervise(monitor, async { tokio::signal::ctrl_c().await.ok(); }, &ProcessExit).await;
//! database.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `settings.rs` - Environment variables into sqlx connect/pool options
//! - `connection.rs` - Pool construction and the shared [`Database`] handle
//! - `observer.rs` - Connect and error observers
//! - `supervisor.rs` - Fatal signal and process-exit policy
//! - `error.rs` - Error type for pool construction

pub mod connection;
pub mod error;
pub mod observer;
pub mod settings;
pub mod supervisor;

pub use connection::Database;
pub use error::DatabaseError;
pub use observer::{LoggingObserver, PoolObserver};
pub use settings::ConnectionSettings;
pub use supervisor::{FatalSignal, HealthMonitor, PoolHealth, Shutdown};
