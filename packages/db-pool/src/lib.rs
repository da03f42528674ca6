//! SQLite connection pool with on-demand overflow and idle reclamation.
//!
//! Work runs against a borrowed connection only through
//! [`ConnectionPool::with_connection`] (or [`ConnectionPool::with_transaction`]),
//! which returns the connection on every exit path.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod query;
mod reaper;
mod scoped;

pub use config::{DatabaseLocation, PoolConfig, RuntimeEnv};
pub use connection::{
    build_session_statements, ConnectionFactory, SessionSettings, SqliteConnectionFactory,
};
pub use error::{DbError, PoolError};
pub use pool::{ConnectionId, ConnectionPool, PoolStatus};

#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    habits_test_support::logging::init();
}
