use thiserror::Error;

/// Failures raised by the pool itself.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Opening a connection or applying its session settings failed.
    #[error("failed to open database connection: {source}")]
    Connection {
        #[source]
        source: sqlx::Error,
    },

    /// Warm-up of the base connections failed.
    #[error("connection pool initialization failed: {source}")]
    Init {
        #[source]
        source: Box<PoolError>,
    },

    /// No idle connection and the overflow cap is reached.
    #[error("connection pool exhausted: {overflow} overflow connections open (max {max_overflow})")]
    Exhausted { overflow: usize, max_overflow: usize },

    /// Teardown orchestration failed outside the per-connection close loop.
    #[error("connection pool shutdown failed: {message}")]
    Shutdown { message: String },
}

impl PoolError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn connection(source: sqlx::Error) -> Self {
        Self::Connection { source }
    }

    pub fn init(source: PoolError) -> Self {
        Self::Init {
            source: Box::new(source),
        }
    }
}

/// Failures from work run through the pool (query helpers, transactions).
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The transaction was rolled back because its body failed.
    #[error("transaction rolled back: {source}")]
    Transaction {
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    pub fn transaction(source: DbError) -> Self {
        match source {
            already @ DbError::Transaction { .. } => already,
            other => Self::Transaction {
                source: Box::new(other),
            },
        }
    }

    /// Unwraps transaction wrappers to the failure that caused them.
    pub fn root(&self) -> &DbError {
        match self {
            DbError::Transaction { source } => source.root(),
            other => other,
        }
    }

    /// True when the underlying failure is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self.root() {
            DbError::Query(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// True when the underlying failure is a foreign-key violation.
    pub fn is_foreign_key_violation(&self) -> bool {
        match self.root() {
            DbError::Query(sqlx::Error::Database(db_err)) => db_err.is_foreign_key_violation(),
            _ => false,
        }
    }
}
