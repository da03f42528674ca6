use db_pool::DbError;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct HabitLog {
    pub id: i64,
    pub habit_id: i64,
    #[serde(with = "iso_date")]
    pub completed_on: Date,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, habit_id, completed_on, note, created_at";

pub async fn create(
    conn: &mut SqliteConnection,
    habit_id: i64,
    completed_on: Date,
    note: Option<&str>,
) -> Result<HabitLog, DbError> {
    let log = sqlx::query_as::<_, HabitLog>(&format!(
        "INSERT INTO habit_logs (habit_id, completed_on, note, created_at) \
         VALUES (?, ?, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(habit_id)
    .bind(completed_on)
    .bind(note)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(conn)
    .await?;
    Ok(log)
}

/// Newest first, optionally bounded by inclusive dates.
pub async fn list_for_habit(
    conn: &mut SqliteConnection,
    habit_id: i64,
    from: Option<Date>,
    to: Option<Date>,
) -> Result<Vec<HabitLog>, DbError> {
    let logs = sqlx::query_as::<_, HabitLog>(&format!(
        "SELECT {COLUMNS} FROM habit_logs \
         WHERE habit_id = ?1 \
           AND (?2 IS NULL OR completed_on >= ?2) \
           AND (?3 IS NULL OR completed_on <= ?3) \
         ORDER BY completed_on DESC"
    ))
    .bind(habit_id)
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await?;
    Ok(logs)
}

pub async fn delete_on(
    conn: &mut SqliteConnection,
    habit_id: i64,
    completed_on: Date,
) -> Result<bool, DbError> {
    let done = sqlx::query("DELETE FROM habit_logs WHERE habit_id = ? AND completed_on = ?")
        .bind(habit_id)
        .bind(completed_on)
        .execute(conn)
        .await?;
    Ok(done.rows_affected() > 0)
}
