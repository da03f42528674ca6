//! Connection factory: opens one physical SQLite connection and applies
//! the session settings every pooled connection must carry.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use tracing::{debug, trace};

use crate::config::{DatabaseLocation, PoolConfig, RuntimeEnv};
use crate::error::PoolError;

/// Opens physical connections for the pool. No retries at this layer.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    async fn open(&self) -> Result<SqliteConnection, PoolError>;

    /// Human-readable target used in log lines.
    fn describe(&self) -> String {
        "sqlite".to_string()
    }
}

/// Session settings applied right after a connection opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub busy_timeout: Duration,
    pub env: RuntimeEnv,
}

/// Build the ordered PRAGMA statements for a new connection.
/// Durability settings are only touched in production-like environments.
pub fn build_session_statements(settings: &SessionSettings) -> Vec<String> {
    let mut stmts = vec![
        "PRAGMA foreign_keys = ON;".to_string(),
        format!(
            "PRAGMA busy_timeout = {};",
            settings.busy_timeout.as_millis()
        ),
    ];
    if settings.env.is_production_like() {
        stmts.push("PRAGMA journal_mode = WAL;".to_string());
        stmts.push("PRAGMA synchronous = NORMAL;".to_string());
    }
    stmts
}

/// Default factory backed by `sqlx`.
///
/// Connect options are parsed once, so every connection opened for an
/// in-memory location attaches to the same shared-cache database. Two
/// factories never share an in-memory database.
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    options: SqliteConnectOptions,
    location: DatabaseLocation,
    settings: SessionSettings,
}

impl SqliteConnectionFactory {
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        let options = match &config.location {
            DatabaseLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(PoolError::connection)?,
            DatabaseLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        }
        .disable_statement_logging();

        Ok(Self {
            options,
            location: config.location.clone(),
            settings: SessionSettings {
                busy_timeout: config.busy_timeout,
                env: config.env,
            },
        })
    }

    async fn apply_session_settings(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        for stmt in build_session_statements(&self.settings) {
            sqlx::query(&stmt).execute(&mut *conn).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionFactory for SqliteConnectionFactory {
    async fn open(&self) -> Result<SqliteConnection, PoolError> {
        let mut conn = self.options.connect().await.map_err(PoolError::connection)?;

        if let Err(e) = self.apply_session_settings(&mut conn).await {
            // The handle is useless without its session settings
            let _ = conn.close().await;
            return Err(PoolError::connection(e));
        }

        trace!(
            "db=sqlite hook=session_settings ok production_like={}",
            self.settings.env.is_production_like()
        );
        debug!(path = %self.location.describe(), "connection=open");
        Ok(conn)
    }

    fn describe(&self) -> String {
        self.location.describe()
    }
}
