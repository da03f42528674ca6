//! Error codes for the habits API.
//!
//! Every code is SCREAMING_SNAKE_CASE and appears verbatim in the `code`
//! field of problem-details responses. Add new codes here; never pass
//! ad-hoc strings as error codes.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    UnauthorizedMissingBearer,
    UnauthorizedInvalidJwt,
    UnauthorizedExpiredJwt,
    /// Token is valid but its user no longer exists
    ForbiddenUserNotFound,

    // Request Validation
    InvalidHabitId,
    InvalidEmail,
    InvalidSub,
    InvalidHabitName,
    InvalidFrequency,
    InvalidDate,
    /// `from` after `to` in a log query
    InvalidDateRange,
    ValidationError,
    BadRequest,

    // Resource Not Found
    HabitNotFound,
    UserNotFound,
    LogNotFound,
    NotFound,

    // Conflicts
    /// Email already linked to a different external subject
    SubMismatch,
    UniqueEmail,
    LogAlreadyExists,
    Conflict,

    // System Errors
    DbError,
    DbUnavailable,
    Internal,
    ConfigError,
}

impl ErrorCode {
    /// The exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::UnauthorizedInvalidJwt => "UNAUTHORIZED_INVALID_JWT",
            Self::UnauthorizedExpiredJwt => "UNAUTHORIZED_EXPIRED_JWT",
            Self::ForbiddenUserNotFound => "FORBIDDEN_USER_NOT_FOUND",

            Self::InvalidHabitId => "INVALID_HABIT_ID",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidSub => "INVALID_SUB",
            Self::InvalidHabitName => "INVALID_HABIT_NAME",
            Self::InvalidFrequency => "INVALID_FREQUENCY",
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::HabitNotFound => "HABIT_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::LogNotFound => "LOG_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::SubMismatch => "SUB_MISMATCH",
            Self::UniqueEmail => "UNIQUE_EMAIL",
            Self::LogAlreadyExists => "LOG_ALREADY_EXISTS",
            Self::Conflict => "CONFLICT",


            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
