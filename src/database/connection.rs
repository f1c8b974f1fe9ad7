//! Database Connection Management
//!
//! This module provides the process-wide PostgreSQL connection pool. The pool
//! is built once at startup and handed to every consumer as a [`Database`]
//! handle; clones share the same underlying connections.
//!
//! ## Features
//!
//! - **Lazy Connection**: Building the pool never touches the network; the
//!   first checkout opens the first connection
//! - **Environment Configuration**: Connection parameters from `DB_*` variables
//! - **Relaxed TLS**: Encrypted transport without server certificate
//!   validation unless `DB_SSL_MODE` says otherwise
//! - **Lifecycle Observers**: Connect and background-error events are reported
//!   to a [`PoolObserver`]

use std::sync::Arc;

use sqlx::{Connection, PgPool};

use crate::database::error::DatabaseError;
use crate::database::observer::PoolObserver;
use crate::database::settings::ConnectionSettings;

/// Shared handle to the application's connection pool.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Builds the connection pool without opening any connection.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `settings` - Connection parameters, usually from [`ConnectionSettings::from_env`]
    /// * `observer` - Receives connect and background-error events
    ///
    /// # Returns
    ///
    /// `Result<Database, DatabaseError>` - Fails only for a `DB_PORT` or
    /// `DB_SSL_MODE` that cannot be parsed. Missing or wrong credentials
    /// surface on the first checkout instead.
    ///
    /// # Observer Wiring
    ///
    /// - **Connect**: every new physical connection calls `on_connect` once
    /// - **Error**: idle connections are pinged before they are handed out; a
    ///   failed ping means the server dropped the connection in the background,
    ///   so `on_error` is called and the connection is discarded
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use hrms_db::database::connection::Database;
    /// use hrms_db::database::observer::LoggingObserver;
    /// use hrms_db::database::settings::ConnectionSettings;
    /// use hrms_db::database::supervisor::FatalSignal;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let settings = ConnectionSettings::from_env()?;
    /// let (fatal, _monitor) = FatalSignal::channel();
    /// let database = Database::connect_lazy(&settings, Arc::new(LoggingObserver::new(fatal)))?;
    /// let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(database.pool()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect_lazy(
        settings: &ConnectionSettings,
        observer: Arc<dyn PoolObserver>,
    ) -> Result<Self, DatabaseError> {
        let connect_options = settings.connect_options()?;
        tracing::debug!(
            host = connect_options.get_host(),
            port = connect_options.get_port(),
            database = connect_options.get_database().unwrap_or_default(),
            "creating database pool"
        );

        let on_connect = Arc::clone(&observer);
        let on_error = observer;

        let pool = settings
            .pool_options()
            .test_before_acquire(false)
            .after_connect(move |_conn, _meta| {
                let observer = Arc::clone(&on_connect);
                Box::pin(async move {
                    observer.on_connect();
                    Ok(())
                })
            })
            .before_acquire(move |conn, _meta| {
                let observer = Arc::clone(&on_error);
                Box::pin(async move {
                    match conn.ping().await {
                        Ok(()) => Ok(true),
                        Err(error) => {
                            observer.on_error(&error);
                            Ok(false)
                        }
                    }
                })
            })
            .connect_lazy_with(connect_options);

        Ok(Self { pool })
    }

    /// The underlying sqlx pool, for issuing queries.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the pool for every handle, waiting for checked-out connections
    /// to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}
