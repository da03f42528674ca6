use std::env;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,actix_web=info,db_pool=info,sqlx=warn";

/// `HABITS_LOG_FORMAT=compact` switches to human-readable lines for local
/// runs; anything else keeps JSON.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let compact = env::var("HABITS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("compact"))
        .unwrap_or(false);

    let json_layer = (!compact).then(|| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });
    let compact_layer = compact.then(|| fmt::layer().with_target(true).compact());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .init();
}
