//! SQL access over a borrowed `SqliteConnection`. Callers obtain the
//! connection through the pool's scoped façade.

pub mod habit_logs;
pub mod habits;
pub mod users;
