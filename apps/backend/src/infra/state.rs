use db_pool::{ConnectionPool, PoolConfig};
use tracing::{error, info};

use crate::error::AppError;
use crate::infra::schema::ensure_schema;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builds [`AppState`] for both the binary and tests: creates the pool,
/// warms it up, and makes sure the schema exists.
pub struct StateBuilder {
    security_config: SecurityConfig,
    pool_config: PoolConfig,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            pool_config: PoolConfig::default(),
        }
    }

    pub fn with_pool_config(mut self, pool_config: PoolConfig) -> Self {
        self.pool_config = pool_config;
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let pool = ConnectionPool::new(self.pool_config)?;
        pool.initialize().await?;
        if let Err(e) = ensure_schema(&pool).await {
            // Do not leave a warmed pool behind
            if let Err(shutdown_err) = pool.shutdown().await {
                error!(error = %shutdown_err, "state=pool_shutdown_failed");
            }
            return Err(AppError::from(e));
        }
        info!(location = %pool.config().location.describe(), "state=ready");
        Ok(AppState::new(pool, self.security_config))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infra::schema::list_tables;

    #[tokio::test]
    async fn builds_ready_state() {
        let state = build_state()
            .with_pool_config(PoolConfig::in_memory().with_pool_size(2))
            .build()
            .await
            .unwrap();

        let status = state.pool.status();
        assert!(status.initialized);
        assert_eq!(status.size, 2);
        assert_eq!(list_tables(&state.pool).await.unwrap().len(), 3);
        state.pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn schema_failure_is_reported_and_pool_released() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocked.db");

        // A view squatting on `habits` makes its index creation fail
        let seed = ConnectionPool::new(PoolConfig::file(&path).with_pool_size(1)).unwrap();
        db_pool::query::execute(&seed, "CREATE VIEW habits AS SELECT 1 AS id, 1 AS user_id")
            .await
            .unwrap();
        seed.shutdown().await.unwrap();

        let result = build_state()
            .with_pool_config(PoolConfig::file(&path).with_pool_size(1))
            .build()
            .await;
        assert!(result.is_err());
        assert!(!matches!(result, Err(AppError::Config { .. })));

        // Nothing from the failed attempt holds the file open
        let reopened = ConnectionPool::new(PoolConfig::file(&path).with_pool_size(1)).unwrap();
        db_pool::query::execute(&reopened, "DROP VIEW habits").await.unwrap();
        ensure_schema(&reopened).await.unwrap();
        reopened.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_pool_config_is_a_config_error() {
        let result = build_state()
            .with_pool_config(PoolConfig::in_memory().with_idle_timeout(Duration::ZERO))
            .build()
            .await;
        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
