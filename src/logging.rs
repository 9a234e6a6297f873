use anyhow::Context;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a file-backed tracing subscriber. `RUST_LOG` wins over `default_filter`.
///
/// With no path nothing is installed: the alternate screen owns stdout/stderr,
/// so console logging would tear the frame.
pub fn init_logging(path: Option<&Path>, default_filter: &str) -> anyhow::Result<bool> {
    let Some(path) = path else {
        return Ok(false);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("create log file {}", path.display()))?;

    let file_layer = fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(true)
}

pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}
