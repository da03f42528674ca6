use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};

use crate::auth::jwt::Claims;
use crate::error::AppError;
use crate::repos::users::User;
use crate::services::users::require_by_sub;
use crate::state::app_state::AppState;

/// The user behind the request's verified token.
///
/// Reads the [`Claims`] that `JwtExtract` stored in request extensions and
/// loads the matching row. A token for a user that no longer exists is
/// rejected with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let app_state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let claims = claims.ok_or_else(AppError::unauthorized_missing_bearer)?;
            let app_state =
                app_state.ok_or_else(|| AppError::internal("AppState not available"))?;

            let user = require_by_sub(&app_state.pool, claims.sub).await?;
            Ok(CurrentUser(user))
        })
    }
}
