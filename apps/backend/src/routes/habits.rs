use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::{CurrentUser, HabitId, ValidatedJson};
use crate::services::habits::{self, HabitDraft, HabitPatch};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub archived: Option<bool>,
}

async fn list(
    user: CurrentUser,
    query: web::Query<ListQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let habits = habits::list(&app_state.pool, user.id, query.include_archived).await?;
    Ok(HttpResponse::Ok().json(habits))
}

async fn create(
    user: CurrentUser,
    body: ValidatedJson<CreateHabitRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let draft = HabitDraft {
        name: body.name,
        description: body.description,
        frequency: body.frequency,
    };
    let habit = habits::create(&app_state.pool, user.id, draft).await?;
    Ok(HttpResponse::Created().json(habit))
}

async fn get(
    user: CurrentUser,
    habit_id: HabitId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let habit = habits::get(&app_state.pool, user.id, habit_id.0).await?;
    Ok(HttpResponse::Ok().json(habit))
}

async fn update(
    user: CurrentUser,
    habit_id: HabitId,
    body: ValidatedJson<UpdateHabitRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let patch = HabitPatch {
        name: body.name,
        description: body.description,
        frequency: body.frequency,
        archived: body.archived,
    };
    let habit = habits::update(&app_state.pool, user.id, habit_id.0, patch).await?;
    Ok(HttpResponse::Ok().json(habit))
}

async fn delete(
    user: CurrentUser,
    habit_id: HabitId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    habits::delete(&app_state.pool, user.id, habit_id.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/{habit_id}")
            .route(web::get().to(get))
            .route(web::patch().to(update))
            .route(web::delete().to(delete)),
    );
}
