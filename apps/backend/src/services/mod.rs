pub mod habit_logs;
pub mod habits;
pub mod users;
