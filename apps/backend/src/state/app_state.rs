use db_pool::ConnectionPool;

use super::security_config::SecurityConfig;

/// Shared resources handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Initialized connection pool with the schema in place
    pub pool: ConnectionPool,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(pool: ConnectionPool, security: SecurityConfig) -> Self {
        Self { pool, security }
    }
}
