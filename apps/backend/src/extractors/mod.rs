pub mod current_user;
pub mod habit_id;
pub mod validated_json;

pub use current_user::CurrentUser;
pub use habit_id::HabitId;
pub use validated_json::ValidatedJson;
