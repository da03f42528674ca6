use std::fmt;
use std::str::FromStr;

use db_pool::DbError;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use time::OffsetDateTime;

/// How often a habit is meant to be done. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            other => Err(format!("unknown frequency '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub archived: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
}

const COLUMNS: &str =
    "id, user_id, name, description, frequency, archived, created_at, updated_at";

/// Oldest first.
pub async fn list_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    include_archived: bool,
) -> Result<Vec<Habit>, DbError> {
    let habits = sqlx::query_as::<_, Habit>(&format!(
        "SELECT {COLUMNS} FROM habits \
         WHERE user_id = ? AND (? OR archived = 0) \
         ORDER BY created_at, id"
    ))
    .bind(user_id)
    .bind(include_archived)
    .fetch_all(conn)
    .await?;
    Ok(habits)
}

/// A habit owned by someone else is indistinguishable from a missing one.
pub async fn find_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    habit_id: i64,
) -> Result<Option<Habit>, DbError> {
    let habit = sqlx::query_as::<_, Habit>(&format!(
        "SELECT {COLUMNS} FROM habits WHERE id = ? AND user_id = ?"
    ))
    .bind(habit_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(habit)
}

pub async fn create(conn: &mut SqliteConnection, new: &NewHabit) -> Result<Habit, DbError> {
    let now = OffsetDateTime::now_utc();
    let habit = sqlx::query_as::<_, Habit>(&format!(
        "INSERT INTO habits \
         (user_id, name, description, frequency, archived, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 0, ?, ?) RETURNING {COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.frequency)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(habit)
}

/// Writes every mutable column of `habit` and bumps `updated_at`.
pub async fn update(conn: &mut SqliteConnection, habit: &Habit) -> Result<Habit, DbError> {
    let updated = sqlx::query_as::<_, Habit>(&format!(
        "UPDATE habits SET name = ?, description = ?, frequency = ?, archived = ?, updated_at = ? \
         WHERE id = ? AND user_id = ? RETURNING {COLUMNS}"
    ))
    .bind(&habit.name)
    .bind(&habit.description)
    .bind(habit.frequency)
    .bind(habit.archived)
    .bind(OffsetDateTime::now_utc())
    .bind(habit.id)
    .bind(habit.user_id)
    .fetch_one(conn)
    .await?;
    Ok(updated)
}

/// Returns whether a row was deleted. Logs go with it (cascade).
pub async fn delete_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
    habit_id: i64,
) -> Result<bool, DbError> {
    let done = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
        .bind(habit_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(done.rows_affected() > 0)
}
