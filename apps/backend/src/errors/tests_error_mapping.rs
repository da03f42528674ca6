use actix_web::http::StatusCode;
use db_pool::{DbError, PoolError};

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::{AppError, ErrorCode};

#[test]
fn maps_validation_to_400_with_kind_code() {
    let app: AppError =
        DomainError::validation(ValidationKind::HabitName, "name must not be empty").into();
    assert_eq!(app.code(), ErrorCode::InvalidHabitName);
    assert_eq!(app.status(), StatusCode::BAD_REQUEST);

    let app: AppError = DomainError::validation(ValidationKind::DateRange, "from > to").into();
    assert_eq!(app.code(), ErrorCode::InvalidDateRange);
}

#[test]
fn maps_conflicts() {
    let app: AppError =
        DomainError::conflict(ConflictKind::LogAlreadyExists, "already logged").into();
    assert_eq!(app.code().as_str(), "LOG_ALREADY_EXISTS");
    assert_eq!(app.status().as_u16(), 409);

    let app: AppError = DomainError::conflict(ConflictKind::SubMismatch, "linked").into();
    assert_eq!(app.code(), ErrorCode::SubMismatch);

    let app: AppError = DomainError::conflict(ConflictKind::Other("x".into()), "generic").into();
    assert_eq!(app.code(), ErrorCode::Conflict);
    assert_eq!(app.status().as_u16(), 409);
}

#[test]
fn maps_not_found() {
    let app: AppError = DomainError::not_found(NotFoundKind::Habit, "no habit").into();
    assert_eq!(app.code(), ErrorCode::HabitNotFound);
    assert_eq!(app.status().as_u16(), 404);
}

#[test]
fn maps_infra() {
    let app: AppError = DomainError::infra(InfraErrorKind::DbUnavailable, "down").into();
    assert_eq!(app.code(), ErrorCode::DbUnavailable);
    assert_eq!(app.status().as_u16(), 503);

    let app: AppError = DomainError::infra(InfraErrorKind::DataCorruption, "bad row").into();
    assert_eq!(app.code(), ErrorCode::Internal);
    assert_eq!(app.status().as_u16(), 500);
}

#[test]
fn pool_exhaustion_is_service_unavailable() {
    let app: AppError = PoolError::Exhausted {
        overflow: 4,
        max_overflow: 4,
    }
    .into();
    assert_eq!(app.code(), ErrorCode::DbUnavailable);
    assert_eq!(app.status().as_u16(), 503);

    let app: AppError = DbError::transaction(DbError::Pool(PoolError::Exhausted {
        overflow: 1,
        max_overflow: 1,
    }))
    .into();
    assert_eq!(app.code(), ErrorCode::DbUnavailable);
}

#[test]
fn other_database_failures_are_500() {
    let app: AppError = DbError::Query(sqlx::Error::PoolTimedOut).into();
    assert_eq!(app.code(), ErrorCode::DbError);
    assert_eq!(app.status().as_u16(), 500);
}
