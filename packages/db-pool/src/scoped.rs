//! Scoped access: borrow a connection for the duration of one unit of work.

use futures_util::future::BoxFuture;
use sqlx::{Connection, SqliteConnection};
use tracing::warn;

use crate::error::{DbError, PoolError};
use crate::pool::ConnectionPool;

impl ConnectionPool {
    /// Run `work` with a borrowed connection and give it back afterwards,
    /// whatever the outcome. The work's own result is returned unchanged.
    ///
    /// If the returned future is dropped mid-work the connection is still
    /// returned to the pool.
    ///
    /// ```no_run
    /// # use db_pool::{ConnectionPool, DbError};
    /// # async fn demo(pool: ConnectionPool) -> Result<i64, DbError> {
    /// pool.with_connection(|conn| {
    ///     Box::pin(async move {
    ///         let (n,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(conn).await?;
    ///         Ok::<_, DbError>(n)
    ///     })
    /// })
    /// .await
    /// # }
    /// ```
    pub async fn with_connection<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, E>>,
        E: From<PoolError>,
    {
        let mut lease = self.acquire().await.map_err(E::from)?;
        let result = work(lease.conn()).await;
        lease.release().await;
        result
    }

    /// Like [`ConnectionPool::with_connection`], wrapped in a transaction:
    /// committed when `work` succeeds, rolled back otherwise.
    pub async fn with_transaction<T, F>(&self, work: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, DbError>>,
    {
        let mut lease = self.acquire().await?;
        let result = run_in_transaction(lease.conn(), work).await;
        lease.release().await;
        result
    }
}

async fn run_in_transaction<T, F>(conn: &mut SqliteConnection, work: F) -> Result<T, DbError>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, DbError>>,
{
    let mut tx = conn.begin().await?;
    match work(&mut *tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "transaction=rollback_failed");
            }
            Err(DbError::transaction(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::PoolConfig;

    fn pool() -> ConnectionPool {
        ConnectionPool::new(
            PoolConfig::in_memory()
                .with_pool_size(1)
                .with_idle_timeout(Duration::from_secs(60)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn connection_is_returned_after_success_and_failure() {
        let pool = pool();

        let n = pool
            .with_connection(|conn| {
                Box::pin(async move {
                    let (n,): (i64,) = sqlx::query_as("SELECT 41 + 1").fetch_one(conn).await?;
                    Ok::<_, DbError>(n)
                })
            })
            .await
            .unwrap();
        assert_eq!(n, 42);
        assert_eq!(pool.status().in_use, 0);

        let err = pool
            .with_connection(|conn| {
                Box::pin(async move {
                    sqlx::query("SELECT * FROM missing_table").execute(conn).await?;
                    Ok::<_, DbError>(())
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Query(_)));
        assert_eq!(pool.status().in_use, 0);
        assert_eq!(pool.status().size, 1);

        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn work_error_type_is_preserved() {
        #[derive(Debug, PartialEq)]
        enum AppFailure {
            Pool,
            Rejected(&'static str),
        }
        impl From<PoolError> for AppFailure {
            fn from(_: PoolError) -> Self {
                AppFailure::Pool
            }
        }

        let pool = pool();
        let err = pool
            .with_connection(|_conn| {
                Box::pin(async move { Err::<(), _>(AppFailure::Rejected("nope")) })
            })
            .await
            .unwrap_err();
        assert_eq!(err, AppFailure::Rejected("nope"));
        assert_ne!(err, AppFailure::Pool);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn failed_transaction_leaves_no_trace() {
        let pool = pool();
        pool.with_connection(|conn| {
            Box::pin(async move {
                sqlx::query("CREATE TABLE items (name TEXT NOT NULL UNIQUE)")
                    .execute(conn)
                    .await?;
                Ok::<_, DbError>(())
            })
        })
        .await
        .unwrap();

        let err = pool
            .with_transaction(|conn| {
                Box::pin(async move {
                    sqlx::query("INSERT INTO items (name) VALUES ('a')")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("INSERT INTO items (name) VALUES ('a')")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Transaction { .. }));
        assert!(err.is_unique_violation());

        pool.with_transaction(|conn| {
            Box::pin(async move {
                sqlx::query("INSERT INTO items (name) VALUES ('b')")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap();

        let names: Vec<(String,)> = pool
            .with_connection(|conn| {
                Box::pin(async move {
                    Ok::<_, DbError>(
                        sqlx::query_as("SELECT name FROM items ORDER BY name")
                            .fetch_all(conn)
                            .await?,
                    )
                })
            })
            .await
            .unwrap();
        assert_eq!(names, vec![("b".to_string(),)]);
        assert_eq!(pool.status().in_use, 0);
        pool.shutdown().await.unwrap();
    }
}
