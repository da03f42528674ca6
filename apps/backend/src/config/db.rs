use std::env;

use db_pool::{PoolConfig, RuntimeEnv};

use crate::error::AppError;

/// Pool configuration from `HABITS_DB_*` / `HABITS_ENV`.
pub fn pool_config() -> Result<PoolConfig, AppError> {
    PoolConfig::from_env().map_err(|e| AppError::config(e.to_string()))
}

/// Like [`pool_config`], with the runtime environment forced.
pub fn pool_config_for(runtime_env: RuntimeEnv) -> Result<PoolConfig, AppError> {
    let config = pool_config()?.with_env(runtime_env);
    Ok(config)
}

/// Get required environment variable or return error
pub(crate) fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}
