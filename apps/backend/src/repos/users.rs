use db_pool::DbError;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    /// External subject the account is linked to
    pub sub: String,
    pub email: String,
    pub username: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, sub, email, username, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn find_by_sub(conn: &mut SqliteConnection, sub: &str) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE sub = ?"))
        .bind(sub)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn find_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, DbError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn create(
    conn: &mut SqliteConnection,
    sub: &str,
    email: &str,
    username: Option<&str>,
) -> Result<User, DbError> {
    let now = OffsetDateTime::now_utc();
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (sub, email, username, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(sub)
    .bind(email)
    .bind(username)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use db_pool::{ConnectionPool, PoolConfig};

    use super::*;
    use crate::infra::schema::ensure_schema;

    async fn pool() -> ConnectionPool {
        let pool = ConnectionPool::new(PoolConfig::in_memory().with_pool_size(1)).unwrap();
        pool.initialize().await.unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_then_find_by_each_key() {
        let pool = pool().await;
        let (created, by_sub, by_email, by_id) = pool
            .with_connection(|conn| {
                Box::pin(async move {
                    let created = create(conn, "sub-1", "ann@example.com", Some("ann")).await?;
                    let by_sub = find_by_sub(conn, "sub-1").await?;
                    let by_email = find_by_email(conn, "ann@example.com").await?;
                    let by_id = find_by_id(conn, created.id).await?;
                    Ok::<_, DbError>((created, by_sub, by_email, by_id))
                })
            })
            .await
            .unwrap();

        assert_eq!(created.username.as_deref(), Some("ann"));
        assert_eq!(by_sub.as_ref(), Some(&created));
        assert_eq!(by_email.as_ref(), Some(&created));
        assert_eq!(by_id, Some(created));
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let pool = pool().await;
        let err = pool
            .with_connection(|conn| {
                Box::pin(async move {
                    create(conn, "sub-1", "ann@example.com", None).await?;
                    create(conn, "sub-2", "ann@example.com", None).await?;
                    Ok::<_, DbError>(())
                })
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        pool.shutdown().await.unwrap();
    }
}
