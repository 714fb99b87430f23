use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::LocalTime},
    layer::SubscriberExt,
    EnvFilter, Registry,
};

pub const LOG_DIR: &str = "logs";
pub const LOG_FILE: &str = "area_pricing.log";
const DEFAULT_FILTER: &str = "area_pricing=debug,info";

/// Stderr plus a daily rolling file. Keep the guard alive for as long as
/// logs should be flushed to disk.
pub fn init_logs() -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .compact()
        .with_timer(LocalTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_timer(LocalTime::rfc_3339())
        .with_ansi(false)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    // eframe and winit log through `log`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("log bridge already installed: {}", e);
    }
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber already installed: {}", e);
    }

    guard
}
