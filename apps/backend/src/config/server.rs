use std::env;
use std::time::Duration;

use crate::config::db::must_var;
use crate::error::AppError;
use crate::state::security_config::DEFAULT_ACCESS_TTL;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;

/// HTTP listener and token signing settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// `BACKEND_ACCESS_TTL_SECS`, 900 when unset
    pub access_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("BACKEND_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("BACKEND_PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|_| {
                AppError::config(format!("BACKEND_PORT must be a valid port number, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_PORT,
        };
        let jwt_secret = must_var("BACKEND_JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(AppError::config("BACKEND_JWT_SECRET must not be empty"));
        }

        let access_ttl = match env::var("BACKEND_ACCESS_TTL_SECS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(AppError::config(format!(
                        "BACKEND_ACCESS_TTL_SECS must be a positive number of seconds, got '{raw}'"
                    )))
                }
            },
            Err(_) => DEFAULT_ACCESS_TTL,
        };

        Ok(Self {
            host,
            port,
            jwt_secret,
            access_ttl,
        })
    }
}
