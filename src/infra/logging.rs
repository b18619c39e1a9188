use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing once, honoring RUST_LOG if set (default `info`).
///
/// Everything goes to stderr: in stdio mode stdout carries the MCP frames.
/// With `log_dir` set, the same events are appended to `<log_dir>/<YYYY-MM-DD>.log`.
pub fn init(log_dir: Option<&Path>) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(&env_filter));

    let file_layer = log_dir.and_then(|dir| match open_day_file(dir) {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(EnvFilter::new(&env_filter)),
        ),
        Err(e) => {
            eprintln!("log file disabled: {}: {e}", dir.display());
            None
        }
    });

    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}

fn open_day_file(dir: &Path) -> std::io::Result<std::fs::File> {
    std::fs::create_dir_all(dir)?;
    let today = chrono::Local::now().format("%Y-%m-%d");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(format!("{today}.log")))
}

/// Log a metric-like line and forward it to the `metrics` facade.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
    if metric.ends_with("_total") {
        metrics::counter!(metric.to_string(), "tool" => tool.to_string()).increment(value as u64);
    } else {
        metrics::histogram!(metric.to_string(), "tool" => tool.to_string()).record(value);
    }
}
