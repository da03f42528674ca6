use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::validated_json::parse_json;
use crate::extractors::{CurrentUser, HabitId};
use crate::services::habit_logs::{self, parse_date};
use crate::state::app_state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogRequest {
    /// `YYYY-MM-DD`; today (UTC) when absent
    pub date: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// The body is optional; an empty one logs today without a note.
async fn log_completion(
    user: CurrentUser,
    habit_id: HabitId,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body: LogRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogRequest::default()
    } else {
        parse_json(&body)?
    };
    let date = body.date.as_deref().map(parse_date).transpose()?;
    let log =
        habit_logs::log_completion(&app_state.pool, user.id, habit_id.0, date, body.note).await?;
    Ok(HttpResponse::Created().json(log))
}

async fn list(
    user: CurrentUser,
    habit_id: HabitId,
    query: web::Query<RangeQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let from = query.from.as_deref().map(parse_date).transpose()?;
    let to = query.to.as_deref().map(parse_date).transpose()?;
    let logs = habit_logs::list_logs(&app_state.pool, user.id, habit_id.0, from, to).await?;
    Ok(HttpResponse::Ok().json(logs))
}

async fn delete(
    user: CurrentUser,
    habit_id: HabitId,
    path: web::Path<(String, String)>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let (_, raw_date) = path.into_inner();
    let date = parse_date(&raw_date)?;
    habit_logs::delete_log(&app_state.pool, user.id, habit_id.0, date).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{habit_id}/logs")
            .route(web::get().to(list))
            .route(web::post().to(log_completion)),
    )
    .service(web::resource("/{habit_id}/logs/{date}").route(web::delete().to(delete)));
}
