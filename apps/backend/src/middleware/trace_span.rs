//! Wraps each request in a `request` span so every event emitted while
//! serving it carries `trace_id`, `method` and `path`.
//!
//! The `user` field starts empty; [`record_user`] fills it once a bearer
//! token has been verified. Must sit inside `RequestTrace`.

use std::future::{ready, Ready};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{field, info_span, Instrument, Span};

use super::request_trace::TraceId;
use crate::logging::pii::redact_sub;

/// Attach the (redacted) authenticated subject to the current request span.
pub fn record_user(sub: &str) {
    Span::current().record("user", field::display(redact_sub(sub)));
}

pub struct TraceSpan;

impl<S, B> Transform<S, ServiceRequest> for TraceSpan
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceSpanMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceSpanMiddleware { service }))
    }
}

pub struct TraceSpanMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceSpanMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let span = {
            let extensions = req.extensions();
            let trace_id = extensions.get::<TraceId>().map_or("untraced", |t| t.0.as_str());
            info_span!(
                "request",
                trace_id = %trace_id,
                method = %req.method(),
                path = %req.path(),
                user = field::Empty,
            )
        };

        // Inner middleware does synchronous work in `call`; keep it in the span too
        let fut = {
            let _entered = span.enter();
            self.service.call(req)
        };
        Box::pin(fut.instrument(span))
    }
}
