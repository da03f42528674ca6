//! Infrastructure: schema, state construction, and database error mapping.

pub mod db_errors;
pub mod schema;
pub mod state;
