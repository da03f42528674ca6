use std::time::Duration;

use db_pool::PoolConfig;
use habits_backend::infra::state::build_state;
use habits_backend::state::app_state::AppState;
use habits_backend::state::security_config::SecurityConfig;
use habits_backend::AppError;

pub fn test_security() -> SecurityConfig {
    SecurityConfig::new("test_secret_key_for_testing_purposes_only".as_bytes())
}

/// Fresh in-memory database per call; nothing is shared between tests.
pub async fn build_test_state() -> Result<AppState, AppError> {
    build_test_state_with(PoolConfig::in_memory().with_pool_size(2)).await
}

pub async fn build_test_state_with(pool_config: PoolConfig) -> Result<AppState, AppError> {
    build_state()
        .with_pool_config(pool_config.with_idle_timeout(Duration::from_secs(30)))
        .with_security(test_security())
        .build()
        .await
}
