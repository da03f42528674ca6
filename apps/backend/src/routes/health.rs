use actix_web::{web, HttpResponse};
use db_pool::{query, PoolStatus};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct PoolReport {
    size: usize,
    idle: usize,
    in_use: usize,
    overflow: usize,
}

impl From<PoolStatus> for PoolReport {
    fn from(status: PoolStatus) -> Self {
        Self {
            size: status.size,
            idle: status.idle,
            in_use: status.in_use,
            overflow: status.overflow,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    db: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    db_error: Option<String>,
    pool: PoolReport,
    time: String,
}

/// Liveness plus a `SELECT 1` through the pool. A failing database is
/// reported in the body; the endpoint itself still answers 200.
async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let (db, db_error) = match query::ping(&app_state.pool).await {
        Ok(()) => ("ok", None),
        Err(e) => {
            warn!(error = %e, "health=db_check_failed");
            ("error", Some(AppError::from(e).code().as_str().to_string()))
        }
    };

    let response = HealthResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        db,
        db_error,
        pool: app_state.pool.status().into(),
        time,
    };
    Ok(HttpResponse::Ok().json(response))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
