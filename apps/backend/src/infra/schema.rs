//! DDL for the habits database, issued through the pool's query helpers.

use db_pool::{query, ConnectionPool, DbError};
use tracing::info;

/// Application tables, in creation order.
pub const TABLES: [&str; 3] = ["users", "habits", "habit_logs"];

const CREATE: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sub TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        username TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS habits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        frequency TEXT NOT NULL DEFAULT 'daily' CHECK (frequency IN ('daily', 'weekly')),
        archived INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_habits_user_id ON habits(user_id)",
    "CREATE TABLE IF NOT EXISTS habit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        habit_id INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
        completed_on TEXT NOT NULL,
        note TEXT,
        created_at TEXT NOT NULL,
        UNIQUE (habit_id, completed_on)
    )",
    "CREATE INDEX IF NOT EXISTS idx_habit_logs_habit_id ON habit_logs(habit_id)",
];

const DROP: [&str; 3] = [
    "DROP TABLE IF EXISTS habit_logs",
    "DROP TABLE IF EXISTS habits",
    "DROP TABLE IF EXISTS users",
];

/// Create any missing tables and indexes. Safe to run repeatedly.
pub async fn ensure_schema(pool: &ConnectionPool) -> Result<(), DbError> {
    query::execute_batch(pool, &CREATE).await?;
    info!("schema=ensured");
    Ok(())
}

/// Drop every application table and recreate it empty.
pub async fn reset_schema(pool: &ConnectionPool) -> Result<(), DbError> {
    let statements: Vec<&str> = DROP.iter().chain(CREATE.iter()).copied().collect();
    query::execute_batch(pool, &statements).await?;
    info!("schema=reset");
    Ok(())
}

/// Names of the user tables currently present, sorted.
pub async fn list_tables(pool: &ConnectionPool) -> Result<Vec<String>, DbError> {
    pool.with_connection(|conn| {
        Box::pin(async move {
            let rows: Vec<(String,)> = sqlx::query_as(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .fetch_all(conn)
            .await?;
            Ok::<_, DbError>(rows.into_iter().map(|(name,)| name).collect())
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use db_pool::PoolConfig;

    use super::*;

    fn pool() -> ConnectionPool {
        ConnectionPool::new(PoolConfig::in_memory().with_pool_size(1)).unwrap()
    }

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let pool = pool();
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        assert_eq!(
            list_tables(&pool).await.unwrap(),
            vec!["habit_logs", "habits", "users"]
        );
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn reset_empties_tables() {
        let pool = pool();
        ensure_schema(&pool).await.unwrap();
        query::execute(
            &pool,
            "INSERT INTO users (sub, email, created_at, updated_at) \
             VALUES ('s', 'e@example.com', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .await
        .unwrap();

        reset_schema(&pool).await.unwrap();

        let removed = query::execute(&pool, "DELETE FROM users").await.unwrap();
        assert_eq!(removed, 0);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn frequency_is_constrained() {
        let pool = pool();
        ensure_schema(&pool).await.unwrap();
        query::execute(
            &pool,
            "INSERT INTO users (id, sub, email, created_at, updated_at) \
             VALUES (1, 's', 'e@example.com', 'x', 'x')",
        )
        .await
        .unwrap();

        let err = query::execute(
            &pool,
            "INSERT INTO habits (user_id, name, frequency, created_at, updated_at) \
             VALUES (1, 'n', 'hourly', 'x', 'x')",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Query(sqlx::Error::Database(_))));
        pool.shutdown().await.unwrap();
    }
}
