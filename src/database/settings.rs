//! Database Connection Settings
//!
//! This module reads the connection parameters for the shared PostgreSQL pool
//! from `DB_*` environment variables and turns them into sqlx connect and pool
//! options.
//!
//! ## Environment Variables
//!
//! | Name | Purpose |
//! |---|---|
//! | `DB_HOST` | database server hostname |
//! | `DB_PORT` | database server port |
//! | `DB_NAME` | target database name |
//! | `DB_USER` | authentication username |
//! | `DB_PASSWORD` | authentication password |
//! | `DB_SSL_MODE` | libpq ssl mode, `require` when unset |
//! | `DB_POOL_MAX_CONNECTIONS` | upper bound on open connections |
//! | `DB_POOL_IDLE_TIMEOUT_MS` | idle connections older than this are closed |
//! | `DB_POOL_ACQUIRE_TIMEOUT_MS` | how long a checkout may wait |
//!
//! Values are not checked here. Anything left unset falls through to the
//! sqlx/libpq defaults (`PGHOST`, `localhost:5432`, ...), and wrong
//! credentials only show up when the first connection is attempted. The two
//! values sqlx needs typed, `DB_PORT` and `DB_SSL_MODE`, are rejected when the
//! connect options are built if they cannot be parsed.

use std::fmt;
use std::time::Duration;

use config::{Config, Environment, Map};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use crate::database::error::DatabaseError;

/// SSL mode used when `DB_SSL_MODE` is unset.
///
/// `require` encrypts the transport but accepts any server certificate,
/// including self-signed ones.
pub const DEFAULT_SSL_MODE: PgSslMode = PgSslMode::Require;

/// A password that never shows up in `Debug` output.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Connection parameters for the shared pool, read once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub host: Option<String>,
    /// Kept as text; parsed when the connect options are built.
    pub port: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<Password>,
    pub ssl_mode: Option<String>,
    pub pool_max_connections: Option<u32>,
    pub pool_idle_timeout_ms: Option<u64>,
    pub pool_acquire_timeout_ms: Option<u64>,
}

impl ConnectionSettings {
    /// Reads the settings from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::load(None)
    }

    /// Reads the settings from an explicit set of variables instead of the
    /// process environment.
    ///
    /// # Example
    ///
    /// ```
    /// use hrms_db::database::settings::ConnectionSettings;
    ///
    /// let settings = ConnectionSettings::from_source([("DB_HOST", "db.internal")]).unwrap();
    /// assert_eq!(settings.host.as_deref(), Some("db.internal"));
    /// ```
    pub fn from_source<I, K, V>(vars: I) -> Result<Self, DatabaseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(Some(vars))
    }

    fn load(source: Option<Map<String, String>>) -> Result<Self, DatabaseError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DB")
                    .prefix_separator("_")
                    .ignore_empty(true)
                    .source(source),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Builds the sqlx connect options.
    ///
    /// # Returns
    ///
    /// `PgConnectOptions` carrying every value that was set. A port that is
    /// not a valid `u16` is rejected with [`DatabaseError::Port`] and an
    /// unknown `DB_SSL_MODE` with [`DatabaseError::SslMode`].
    pub fn connect_options(&self) -> Result<PgConnectOptions, DatabaseError> {
        let mut options = PgConnectOptions::new().ssl_mode(self.resolved_ssl_mode()?);

        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = &self.port {
            let parsed = port
                .trim()
                .parse::<u16>()
                .map_err(|source| DatabaseError::Port {
                    value: port.clone(),
                    source,
                })?;
            options = options.port(parsed);
        }
        if let Some(name) = &self.name {
            options = options.database(name);
        }
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password.expose());
        }

        Ok(options)
    }

    /// Builds the sqlx pool options from the `DB_POOL_*` tunables.
    pub fn pool_options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new();

        if let Some(max) = self.pool_max_connections {
            options = options.max_connections(max);
        }
        if let Some(ms) = self.pool_idle_timeout_ms {
            options = options.idle_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.pool_acquire_timeout_ms {
            options = options.acquire_timeout(Duration::from_millis(ms));
        }

        options
    }

    fn resolved_ssl_mode(&self) -> Result<PgSslMode, DatabaseError> {
        match &self.ssl_mode {
            None => Ok(DEFAULT_SSL_MODE),
            Some(value) => value
                .trim()
                .parse::<PgSslMode>()
                .map_err(|source| DatabaseError::SslMode {
                    value: value.clone(),
                    source,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_source() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "hrms_db"),
            ("DB_USER", "hrms"),
            ("DB_PASSWORD", "s3cret@123"),
        ]
    }

    #[test]
    fn test_reads_the_five_connection_variables() {
        let settings = ConnectionSettings::from_source(full_source()).unwrap();

        assert_eq!(settings.host.as_deref(), Some("db.internal"));
        assert_eq!(settings.port.as_deref(), Some("6543"));
        assert_eq!(settings.name.as_deref(), Some("hrms_db"));
        assert_eq!(settings.user.as_deref(), Some("hrms"));
        assert_eq!(
            settings.password.as_ref().map(Password::expose),
            Some("s3cret@123")
        );
    }

    #[test]
    fn test_connect_options_carry_settings() {
        let settings = ConnectionSettings::from_source(full_source()).unwrap();
        let options = settings.connect_options().unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("hrms_db"));
        assert_eq!(options.get_username(), "hrms");
    }

    #[test]
    fn test_certificate_verification_disabled_by_default() {
        let settings = ConnectionSettings::from_source(full_source()).unwrap();
        let options = settings.connect_options().unwrap();

        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn test_ssl_mode_override() {
        let settings =
            ConnectionSettings::from_source([("DB_SSL_MODE", "verify-full")]).unwrap();
        let options = settings.connect_options().unwrap();

        assert!(matches!(options.get_ssl_mode(), PgSslMode::VerifyFull));
    }

    #[test]
    fn test_unknown_ssl_mode_is_rejected() {
        let settings = ConnectionSettings::from_source([("DB_SSL_MODE", "sometimes")]).unwrap();

        match settings.connect_options() {
            Err(DatabaseError::SslMode { value, .. }) => assert_eq!(value, "sometimes"),
            other => panic!("expected ssl mode error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_variables_are_not_validated() {
        let settings =
            ConnectionSettings::from_source(Vec::<(String, String)>::new()).unwrap();

        assert!(settings.host.is_none());
        assert!(settings.password.is_none());
        assert!(settings.connect_options().is_ok());
    }

    #[test]
    fn test_empty_variable_counts_as_unset() {
        let settings = ConnectionSettings::from_source([("DB_HOST", "")]).unwrap();
        assert!(settings.host.is_none());
    }

    #[test]
    fn test_unparseable_port_is_rejected() {
        let settings =
            ConnectionSettings::from_source([("DB_HOST", "db.internal"), ("DB_PORT", "54x2")])
                .unwrap();

        assert_eq!(settings.port.as_deref(), Some("54x2"));
        match settings.connect_options() {
            Err(DatabaseError::Port { value, .. }) => assert_eq!(value, "54x2"),
            other => panic!("expected port error, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_port_is_rejected() {
        let settings = ConnectionSettings::from_source([("DB_PORT", "70000")]).unwrap();

        assert!(matches!(
            settings.connect_options(),
            Err(DatabaseError::Port { .. })
        ));
    }

    #[test]
    fn test_pool_tunables_are_parsed() {
        let settings = ConnectionSettings::from_source([
            ("DB_POOL_MAX_CONNECTIONS", "20"),
            ("DB_POOL_IDLE_TIMEOUT_MS", "30000"),
            ("DB_POOL_ACQUIRE_TIMEOUT_MS", "2000"),
        ])
        .unwrap();
        let options = settings.pool_options();

        assert_eq!(options.get_max_connections(), 20);
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_password_is_redacted() {
        let settings = ConnectionSettings::from_source(full_source()).unwrap();
        let debug = format!("{settings:?}");

        assert!(!debug.contains("s3cret@123"));
        assert!(debug.contains("Password(***)"));
    }
}
