use actix_web::{web, App, HttpServer};
use habits_backend::config::db::pool_config;
use habits_backend::config::server::ServerConfig;
use habits_backend::infra::state::build_state;
use habits_backend::middleware::{
    cors_middleware, RequestTrace, StructuredLogger, TraceSpan,
};
use habits_backend::routes;
use habits_backend::state::security_config::SecurityConfig;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    let server = ServerConfig::from_env().unwrap_or_else(|e| {
        error!(error = %e, "startup=config_failed");
        std::process::exit(1);
    });
    let pool_config = pool_config().unwrap_or_else(|e| {
        error!(error = %e, "startup=config_failed");
        std::process::exit(1);
    });

    let app_state = match build_state()
        .with_pool_config(pool_config)
        .with_security(
            SecurityConfig::new(server.jwt_secret.as_bytes()).with_access_ttl(server.access_ttl),
        )
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "startup=state_failed");
            std::process::exit(1);
        }
    };

    let pool = app_state.pool.clone();
    let data = web::Data::new(app_state);

    info!(host = %server.host, port = server.port, "startup=listening");
    let served = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await;

    if let Err(e) = pool.shutdown().await {
        error!(error = %e, "shutdown=pool_failed");
    }
    info!("shutdown=complete");
    served
}
