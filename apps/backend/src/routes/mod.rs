use actix_web::web;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::middleware::jwt_extract::JwtExtract;

pub mod auth;
pub mod habit_logs;
pub mod habits;
pub mod health;
pub mod me;

/// Register every route. Shared by `main.rs` and the integration tests so
/// both see the same guards.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Query-string failures become problem details too
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::bad_request(ErrorCode::BadRequest, err.to_string()).into()
    }));

    // /health
    cfg.configure(health::configure_routes);

    // /api/auth/**
    cfg.service(web::scope("/api/auth").configure(auth::configure_routes));

    // /api/me
    cfg.service(
        web::scope("/api/me")
            .wrap(JwtExtract)
            .configure(me::configure_routes),
    );

    // /api/habits/**
    cfg.service(
        web::scope("/api/habits")
            .wrap(JwtExtract)
            .configure(habits::configure_routes)
            .configure(habit_logs::configure_routes),
    );
}
