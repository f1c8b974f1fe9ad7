//! Database Error Types
//!
//! Errors raised while turning environment settings into a connection pool.
//! Query-time failures are plain [`sqlx::Error`] values and reach whoever
//! acquired the connection.

use thiserror::Error;

/// Errors produced by the pool provider.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The `DB_*` environment could not be read into [`ConnectionSettings`].
    ///
    /// [`ConnectionSettings`]: crate::database::settings::ConnectionSettings
    #[error("failed to load database settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// `DB_PORT` is not a valid TCP port number.
    #[error("invalid DB_PORT {value:?}")]
    Port {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// `DB_SSL_MODE` is not one of the libpq mode names.
    #[error("invalid DB_SSL_MODE {value:?}")]
    SslMode {
        value: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
