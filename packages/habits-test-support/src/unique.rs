//! Unique fixture values so tests sharing a database never collide.

use uuid::Uuid;

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

/// `{prefix}-{uuid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{prefix}-{}", suffix())
}

/// `{prefix}-{uuid}@example.test`
///
/// ```
/// use habits_test_support::unique::unique_email;
///
/// let a = unique_email("runner");
/// assert_ne!(a, unique_email("runner"));
/// assert!(a.starts_with("runner-") && a.ends_with("@example.test"));
/// ```
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", suffix())
}
