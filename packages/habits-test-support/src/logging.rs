use std::env;

use once_cell::sync::OnceCell;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

static INSTALLED: OnceCell<()> = OnceCell::new();

const QUIET: &str = "warn,sqlx=error";

fn filter() -> EnvFilter {
    ["HABITS_TEST_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|name| env::var(name).ok())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(QUIET))
}

/// Install the test subscriber at most once per test binary.
///
/// `HABITS_TEST_LOG` (or `RUST_LOG`) sets the filter. With
/// `HABITS_TEST_LOG_SPANS=1`, span close events are printed too, which shows
/// how long each request and pool call took.
pub fn init() {
    INSTALLED.get_or_init(|| {
        let spans = match env::var("HABITS_TEST_LOG_SPANS").as_deref() {
            Ok("1") | Ok("true") => FmtSpan::CLOSE,
            _ => FmtSpan::NONE,
        };

        // Another subscriber may already be installed; keep it
        let _ = fmt()
            .with_env_filter(filter())
            .with_span_events(spans)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}
