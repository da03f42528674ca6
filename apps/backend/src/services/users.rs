use db_pool::ConnectionPool;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, ValidationKind};
use crate::logging::pii::{redact_sub, Redacted};
use crate::repos::users::{self, User};

/// Validated login identity.
#[derive(Debug, Clone)]
pub struct LoginIdentity {
    pub email: String,
    pub name: Option<String>,
    pub sub: String,
}

impl LoginIdentity {
    pub fn parse(email: &str, name: Option<&str>, sub: &str) -> Result<Self, DomainError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Email,
                "Email must not be empty",
            ));
        }
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => {
                return Err(DomainError::validation(
                    ValidationKind::Email,
                    "Email must look like name@domain",
                ))
            }
        }

        let sub = sub.trim();
        if sub.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Sub,
                "Subject must not be empty",
            ));
        }

        Ok(Self {
            email: email.to_ascii_lowercase(),
            name: name.map(str::to_string),
            sub: sub.to_string(),
        })
    }
}

/// Find the user for this email, or create one. Idempotent for a repeated
/// email + subject pair; an email already linked to another subject is a
/// conflict.
pub async fn ensure_user(pool: &ConnectionPool, identity: LoginIdentity) -> Result<User, AppError> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            let LoginIdentity { email, name, sub } = identity;

            if let Some(user) = users::find_by_email(conn, &email).await? {
                if user.sub != sub {
                    warn!(
                        user_id = user.id,
                        email = %Redacted(&email),
                        incoming_sub = %redact_sub(&sub),
                        existing_sub = %redact_sub(&user.sub),
                        "Subject mismatch on login"
                    );
                    return Err(AppError::from(DomainError::conflict(
                        ConflictKind::SubMismatch,
                        "This email is already linked to a different account",
                    )));
                }
                debug!(user_id = user.id, email = %Redacted(&email), "Repeat login");
                return Ok(user);
            }

            let username = derive_username(name.as_deref(), &email);
            let user = users::create(conn, &sub, &email, username.as_deref()).await?;
            info!(
                user_id = user.id,
                email = %Redacted(&email),
                sub = %redact_sub(&sub),
                "First login, user created"
            );
            Ok::<_, AppError>(user)
        })
    })
    .await
}

/// User for a verified token subject; a deleted user is forbidden.
pub async fn require_by_sub(pool: &ConnectionPool, sub: String) -> Result<User, AppError> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            users::find_by_sub(conn, &sub)
                .await?
                .ok_or_else(AppError::forbidden_user_not_found)
        })
    })
    .await
}

/// The provided name, else the email local part.
fn derive_username(name: Option<&str>, email: &str) -> Option<String> {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }
    email
        .split_once('@')
        .map(|(local, _)| local)
        .filter(|local| !local.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use db_pool::PoolConfig;

    use super::*;
    use crate::errors::ErrorCode;
    use crate::infra::schema::ensure_schema;

    async fn pool() -> ConnectionPool {
        let pool = ConnectionPool::new(PoolConfig::in_memory().with_pool_size(2)).unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    fn identity(email: &str, sub: &str) -> LoginIdentity {
        LoginIdentity::parse(email, None, sub).unwrap()
    }

    #[test]
    fn username_prefers_name_then_local_part() {
        assert_eq!(derive_username(Some("  Ann  "), "a@x.io").as_deref(), Some("Ann"));
        assert_eq!(derive_username(Some("  "), "bo@x.io").as_deref(), Some("bo"));
        assert_eq!(derive_username(None, "@x.io"), None);
    }

    #[test]
    fn identity_is_validated_and_normalized() {
        let id = LoginIdentity::parse(" Ann@Example.COM ", Some("Ann"), " sub-1 ").unwrap();
        assert_eq!(id.email, "ann@example.com");
        assert_eq!(id.sub, "sub-1");

        assert!(matches!(
            LoginIdentity::parse("", None, "s"),
            Err(DomainError::Validation(ValidationKind::Email, _))
        ));
        assert!(matches!(
            LoginIdentity::parse("no-at-sign", None, "s"),
            Err(DomainError::Validation(ValidationKind::Email, _))
        ));
        assert!(matches!(
            LoginIdentity::parse("a@b.c", None, "   "),
            Err(DomainError::Validation(ValidationKind::Sub, _))
        ));
    }

    #[tokio::test]
    async fn repeated_login_returns_same_user() {
        let pool = pool().await;
        let first = ensure_user(&pool, identity("ann@example.com", "sub-1")).await.unwrap();
        let second = ensure_user(&pool, identity("ann@example.com", "sub-1")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.username.as_deref(), Some("ann"));
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn email_with_other_subject_conflicts() {
        let pool = pool().await;
        ensure_user(&pool, identity("ann@example.com", "sub-1")).await.unwrap();
        let err = ensure_user(&pool, identity("ann@example.com", "sub-2"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SubMismatch);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn subject_reused_for_other_email_conflicts() {
        let pool = pool().await;
        ensure_user(&pool, identity("ann@example.com", "sub-1")).await.unwrap();
        let err = ensure_user(&pool, identity("bo@example.com", "sub-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SubMismatch);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_subject_is_forbidden() {
        let pool = pool().await;
        let err = require_by_sub(&pool, "ghost".into()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ForbiddenUserNotFound);
        pool.shutdown().await.unwrap();
    }
}
