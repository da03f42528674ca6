//! Pool configuration resolved once at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::PoolError;

/// Reserved location value for a non-persistent database.
pub const MEMORY_LOCATION: &str = ":memory:";

pub const DEFAULT_POOL_SIZE: usize = 5;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Runtime environment; only `Prod` is production-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeEnv {
    Prod,
    #[default]
    Dev,
    Test,
}

impl RuntimeEnv {
    /// Production-like environments get WAL journaling and relaxed fsync.
    pub fn is_production_like(self) -> bool {
        matches!(self, RuntimeEnv::Prod)
    }
}

impl FromStr for RuntimeEnv {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(RuntimeEnv::Prod),
            "dev" | "development" => Ok(RuntimeEnv::Dev),
            "test" => Ok(RuntimeEnv::Test),
            other => Err(PoolError::config(format!(
                "unknown runtime environment '{other}' (expected prod, dev or test)"
            ))),
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// In-memory database shared by every connection of one pool
    Memory,
    /// SQLite file, created if missing
    File(PathBuf),
}

impl DatabaseLocation {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == MEMORY_LOCATION {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(PathBuf::from(raw))
        }
    }

    /// Description used in log lines
    pub fn describe(&self) -> String {
        match self {
            DatabaseLocation::Memory => MEMORY_LOCATION.to_string(),
            DatabaseLocation::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub location: DatabaseLocation,
    /// Base pool size `N`; these connections are never reaped
    pub pool_size: usize,
    /// Idle threshold `T` for overflow connections, also the reaper period
    pub idle_timeout: Duration,
    /// Per-connection busy-wait timeout on lock conflicts
    pub busy_timeout: Duration,
    /// Cap on overflow connections; `None` means unbounded growth
    pub max_overflow: Option<usize>,
    pub env: RuntimeEnv,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            pool_size: DEFAULT_POOL_SIZE,
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            max_overflow: None,
            env: RuntimeEnv::default(),
        }
    }
}

impl PoolConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DatabaseLocation::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_max_overflow(mut self, max_overflow: Option<usize>) -> Self {
        self.max_overflow = max_overflow;
        self
    }

    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.env = env;
        self
    }

    /// Reads `HABITS_DB_*` and `HABITS_ENV`. Unset variables fall back to
    /// defaults; malformed values are errors.
    pub fn from_env() -> Result<Self, PoolError> {
        let location = env::var("HABITS_DB_PATH")
            .map(|raw| DatabaseLocation::parse(&raw))
            .unwrap_or(DatabaseLocation::Memory);

        let env = match env::var("HABITS_ENV") {
            Ok(raw) => raw.parse()?,
            Err(_) => RuntimeEnv::default(),
        };

        let pool_size = parse_var::<usize>("HABITS_DB_POOL_SIZE")?.unwrap_or(DEFAULT_POOL_SIZE);
        let idle_timeout_ms =
            parse_var::<u64>("HABITS_DB_IDLE_TIMEOUT_MS")?.unwrap_or(DEFAULT_IDLE_TIMEOUT_MS);
        let busy_timeout_ms =
            parse_var::<u64>("HABITS_DB_BUSY_TIMEOUT_MS")?.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
        let max_overflow = parse_var::<usize>("HABITS_DB_MAX_OVERFLOW")?;

        let config = Self {
            location,
            pool_size,
            idle_timeout: Duration::from_millis(idle_timeout_ms),
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            max_overflow,
            env,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.pool_size == 0 {
            return Err(PoolError::config("pool size must be at least 1"));
        }
        if self.idle_timeout.is_zero() {
            return Err(PoolError::config("idle timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, PoolError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| PoolError::config(format!("{name} has an invalid value: '{raw}'"))),
        Err(_) => Ok(None),
    }
}
