#![allow(dead_code)]

pub mod app_builder;
pub mod auth;
pub mod test_state;

pub use app_builder::create_test_app;
pub use auth::{bearer, login};
pub use test_state::{build_test_state, test_security};
