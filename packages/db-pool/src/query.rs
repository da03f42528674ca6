//! Raw-statement helpers layered on the scoped façade.

use crate::error::DbError;
use crate::pool::ConnectionPool;

/// Run one statement; returns the number of rows affected.
pub async fn execute(pool: &ConnectionPool, sql: &str) -> Result<u64, DbError> {
    let sql = sql.to_owned();
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let done = sqlx::query(&sql).execute(conn).await?;
            Ok::<_, DbError>(done.rows_affected())
        })
    })
    .await
}

/// Run each statement in order inside one transaction. Nothing is applied
/// unless every statement succeeds.
pub async fn execute_batch<S>(pool: &ConnectionPool, statements: &[S]) -> Result<(), DbError>
where
    S: AsRef<str>,
{
    let statements: Vec<String> = statements.iter().map(|s| s.as_ref().to_owned()).collect();
    pool.with_transaction(move |conn| {
        Box::pin(async move {
            for stmt in &statements {
                sqlx::query(stmt).execute(&mut *conn).await?;
            }
            Ok(())
        })
    })
    .await
}

/// `SELECT 1` through the façade.
pub async fn ping(pool: &ConnectionPool) -> Result<(), DbError> {
    pool.with_connection(|conn| {
        Box::pin(async move {
            let (one,): (i64,) = sqlx::query_as("SELECT 1").fetch_one(conn).await?;
            debug_assert_eq!(one, 1);
            Ok::<_, DbError>(())
        })
    })
    .await
}
