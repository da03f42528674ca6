use db_pool::ConnectionPool;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::info;

use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, ValidationKind};
use crate::repos::habit_logs::{self, HabitLog};
use crate::repos::habits;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<Date, DomainError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        DomainError::validation(
            ValidationKind::Date,
            format!("Invalid date '{raw}', expected YYYY-MM-DD"),
        )
    })
}

/// Both bounds are inclusive; a reversed range is rejected.
pub fn check_range(from: Option<Date>, to: Option<Date>) -> Result<(), DomainError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(DomainError::validation(
            ValidationKind::DateRange,
            format!("'from' ({from}) is after 'to' ({to})"),
        )),
        _ => Ok(()),
    }
}

fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

fn habit_not_found(habit_id: i64) -> AppError {
    AppError::from(DomainError::not_found(
        NotFoundKind::Habit,
        format!("Habit {habit_id} not found"),
    ))
}

/// Mark the caller's habit done on `date` (today in UTC when absent).
pub async fn log_completion(
    pool: &ConnectionPool,
    user_id: i64,
    habit_id: i64,
    date: Option<Date>,
    note: Option<String>,
) -> Result<HabitLog, AppError> {
    let completed_on = date.unwrap_or_else(today_utc);
    let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

    let log = pool
        .with_connection(move |conn| {
            Box::pin(async move {
                habits::find_for_user(conn, user_id, habit_id)
                    .await?
                    .ok_or_else(|| habit_not_found(habit_id))?;
                Ok::<_, AppError>(
                    habit_logs::create(conn, habit_id, completed_on, note.as_deref()).await?,
                )
            })
        })
        .await?;
    info!(user_id, habit_id, completed_on = %completed_on, "Habit completion logged");
    Ok(log)
}

pub async fn list_logs(
    pool: &ConnectionPool,
    user_id: i64,
    habit_id: i64,
    from: Option<Date>,
    to: Option<Date>,
) -> Result<Vec<HabitLog>, AppError> {
    check_range(from, to)?;

    pool.with_connection(move |conn| {
        Box::pin(async move {
            habits::find_for_user(conn, user_id, habit_id)
                .await?
                .ok_or_else(|| habit_not_found(habit_id))?;
            Ok::<_, AppError>(habit_logs::list_for_habit(conn, habit_id, from, to).await?)
        })
    })
    .await
}

pub async fn delete_log(
    pool: &ConnectionPool,
    user_id: i64,
    habit_id: i64,
    date: Date,
) -> Result<(), AppError> {
    pool.with_connection(move |conn| {
        Box::pin(async move {
            habits::find_for_user(conn, user_id, habit_id)
                .await?
                .ok_or_else(|| habit_not_found(habit_id))?;
            if !habit_logs::delete_on(conn, habit_id, date).await? {
                return Err(AppError::from(DomainError::not_found(
                    NotFoundKind::Log,
                    format!("No log for habit {habit_id} on {date}"),
                )));
            }
            Ok::<_, AppError>(())
        })
    })
    .await
}
