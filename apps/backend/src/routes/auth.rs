use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::mint_access_token;
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::logging::security;
use crate::services::users::{ensure_user, LoginIdentity};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    #[serde(default)]
    pub sub: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Find or create the user for `{email, sub}` and issue an access token.
async fn login(
    body: ValidatedJson<LoginRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let identity = LoginIdentity::parse(&body.email, body.name.as_deref(), &body.sub)
        .map_err(AppError::from)
        .inspect_err(|e| security::login_failed(e.code().as_str(), Some(&body.email)))?;

    let user = ensure_user(&app_state.pool, identity)
        .await
        .inspect_err(|e| security::login_failed(e.code().as_str(), Some(&body.email)))?;

    let token = mint_access_token(&user.sub, &user.email, SystemTime::now(), &app_state.security)?;
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/login").route(web::post().to(login)));
}
