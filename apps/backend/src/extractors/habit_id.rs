use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Positive integer `{habit_id}` path segment. Existence and ownership are
/// checked by the services, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HabitId(pub i64);

impl HabitId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let id = raw.parse::<i64>().map_err(|_| {
            AppError::bad_request(ErrorCode::InvalidHabitId, format!("Invalid habit id: {raw}"))
        })?;
        if id <= 0 {
            return Err(AppError::bad_request(
                ErrorCode::InvalidHabitId,
                format!("Habit id must be positive, got: {id}"),
            ));
        }
        Ok(HabitId(id))
    }
}

impl FromRequest for HabitId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match req.match_info().get("habit_id") {
            Some(raw) => HabitId::parse(raw),
            None => Err(AppError::bad_request(
                ErrorCode::InvalidHabitId,
                "Missing habit_id parameter",
            )),
        })
    }
}
