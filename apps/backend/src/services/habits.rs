use db_pool::ConnectionPool;
use tracing::info;

use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::habits::{self, Frequency, Habit, NewHabit};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Fields accepted when creating a habit, before validation.
#[derive(Debug, Clone, Default)]
pub struct HabitDraft {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<String>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    /// An empty string clears the description
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub archived: Option<bool>,
}

pub fn validate_name(raw: &str) -> Result<String, DomainError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 {
        return Err(DomainError::validation(
            ValidationKind::HabitName,
            "Habit name must not be empty",
        ));
    }
    if len > MAX_NAME_CHARS {
        return Err(DomainError::validation(
            ValidationKind::HabitName,
            format!("Habit name must be at most {MAX_NAME_CHARS} characters"),
        ));
    }
    Ok(name.to_string())
}

fn validate_description(raw: Option<&str>) -> Result<Option<String>, DomainError> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::validation(
            ValidationKind::Other("Description".into()),
            format!("Description must be at most {MAX_DESCRIPTION_CHARS} characters"),
        ));
    }
    Ok(Some(description.to_string()))
}

pub fn parse_frequency(raw: &str) -> Result<Frequency, DomainError> {
    raw.parse::<Frequency>().map_err(|_| {
        DomainError::validation(
            ValidationKind::Frequency,
            "Frequency must be 'daily' or 'weekly'",
        )
    })
}

fn habit_not_found(habit_id: i64) -> AppError {
    AppError::from(DomainError::not_found(
        NotFoundKind::Habit,
        format!("Habit {habit_id} not found"),
    ))
}

pub async fn list(
    pool: &ConnectionPool,
    user_id: i64,
    include_archived: bool,
) -> Result<Vec<Habit>, AppError> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            Ok::<_, AppError>(habits::list_for_user(conn, user_id, include_archived).await?)
        })
    })
    .await
}

/// The caller's habit, or 404 whether it is missing or someone else's.
pub async fn get(pool: &ConnectionPool, user_id: i64, habit_id: i64) -> Result<Habit, AppError> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            habits::find_for_user(conn, user_id, habit_id)
                .await?
                .ok_or_else(|| habit_not_found(habit_id))
        })
    })
    .await
}

pub async fn create(
    pool: &ConnectionPool,
    user_id: i64,
    draft: HabitDraft,
) -> Result<Habit, AppError> {
    let new = NewHabit {
        user_id,
        name: validate_name(&draft.name)?,
        description: validate_description(draft.description.as_deref())?,
        frequency: match draft.frequency.as_deref() {
            Some(raw) => parse_frequency(raw)?,
            None => Frequency::default(),
        },
    };

    let habit = pool
        .with_connection(move |conn| {
            Box::pin(async move { Ok::<_, AppError>(habits::create(conn, &new).await?) })
        })
        .await?;
    info!(user_id, habit_id = habit.id, "Habit created");
    Ok(habit)
}

pub async fn update(
    pool: &ConnectionPool,
    user_id: i64,
    habit_id: i64,
    patch: HabitPatch,
) -> Result<Habit, AppError> {
    let name = patch.name.as_deref().map(validate_name).transpose()?;
    let description = patch
        .description
        .as_deref()
        .map(|d| validate_description(Some(d)))
        .transpose()?;
    let frequency = patch.frequency.as_deref().map(parse_frequency).transpose()?;
    let archived = patch.archived;

    pool.with_connection(move |conn| {
        Box::pin(async move {
            let mut habit = habits::find_for_user(conn, user_id, habit_id)
                .await?
                .ok_or_else(|| habit_not_found(habit_id))?;

            if let Some(name) = name {
                habit.name = name;
            }
            if let Some(description) = description {
                habit.description = description;
            }
            if let Some(frequency) = frequency {
                habit.frequency = frequency;
            }
            if let Some(archived) = archived {
                habit.archived = archived;
            }

            Ok::<_, AppError>(habits::update(conn, &habit).await?)
        })
    })
    .await
}

pub async fn delete(pool: &ConnectionPool, user_id: i64, habit_id: i64) -> Result<(), AppError> {
    let deleted = pool
        .with_connection(move |conn| {
            Box::pin(async move {
                Ok::<_, AppError>(habits::delete_for_user(conn, user_id, habit_id).await?)
            })
        })
        .await?;
    if !deleted {
        return Err(habit_not_found(habit_id));
    }
    info!(user_id, habit_id, "Habit deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use db_pool::PoolConfig;

    use super::*;
    use crate::errors::ErrorCode;
    use crate::infra::schema::ensure_schema;
    use crate::services::users::{ensure_user, LoginIdentity};

    async fn setup() -> (ConnectionPool, i64, i64) {
        let pool = ConnectionPool::new(PoolConfig::in_memory().with_pool_size(2)).unwrap();
        ensure_schema(&pool).await.unwrap();
        let a = ensure_user(&pool, LoginIdentity::parse("a@example.com", None, "sub-a").unwrap())
            .await
            .unwrap();
        let b = ensure_user(&pool, LoginIdentity::parse("b@example.com", None, "sub-b").unwrap())
            .await
            .unwrap();
        (pool, a.id, b.id)
    }

    fn draft(name: &str) -> HabitDraft {
        HabitDraft {
            name: name.to_string(),
            ..HabitDraft::default()
        }
    }

    #[test]
    fn name_rules() {
        assert_eq!(validate_name("  Read  ").unwrap(), "Read");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_CHARS)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_CHARS + 1)).is_err());
    }

    #[tokio::test]
    async fn create_defaults_to_daily() {
        let (pool, a, _) = setup().await;
        let habit = create(&pool, a, draft(" Meditate ")).await.unwrap();
        assert_eq!(habit.name, "Meditate");
        assert_eq!(habit.frequency, Frequency::Daily);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn bad_frequency_is_rejected_before_touching_the_db() {
        let (pool, a, _) = setup().await;
        let err = create(
            &pool,
            a,
            HabitDraft {
                frequency: Some("hourly".into()),
                ..draft("Run")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidFrequency);
        assert!(list(&pool, a, true).await.unwrap().is_empty());
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn other_users_habits_are_not_found() {
        let (pool, a, b) = setup().await;
        let habit = create(&pool, a, draft("Read")).await.unwrap();

        for err in [
            get(&pool, b, habit.id).await.unwrap_err(),
            update(&pool, b, habit.id, HabitPatch::default()).await.unwrap_err(),
            delete(&pool, b, habit.id).await.unwrap_err(),
        ] {
            assert_eq!(err.code(), ErrorCode::HabitNotFound);
        }
        assert_eq!(get(&pool, a, habit.id).await.unwrap().id, habit.id);
        pool.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn patch_changes_only_given_fields() {
        let (pool, a, _) = setup().await;
        let habit = create(
            &pool,
            a,
            HabitDraft {
                description: Some("pages".into()),
                ..draft("Read")
            },
        )
        .await
        .unwrap();

        let updated = update(
            &pool,
            a,
            habit.id,
            HabitPatch {
                frequency: Some("weekly".into()),
                archived: Some(true),
                ..HabitPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Read");
        assert_eq!(updated.description.as_deref(), Some("pages"));
        assert_eq!(updated.frequency, Frequency::Weekly);
        assert!(updated.archived);

        let cleared = update(
            &pool,
            a,
            habit.id,
            HabitPatch {
                description: Some(String::new()),
                ..HabitPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.description, None);
        pool.shutdown().await.unwrap();
    }
}
