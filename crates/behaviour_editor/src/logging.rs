use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::EditorConfig;

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init(config: &EditorConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    if config.log_json {
        // JSON formatting for structured logs
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);

        Registry::default()
            .with(env_filter)
            .with(json_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Behaviour editor starting");
    Ok(())
}

/// Log configuration
pub fn log_config(config: &EditorConfig) {
    tracing::debug!(
        history_limit = config.history_limit,
        templates = ?config.templates,
        resources = ?config.resources,
        duplicate_offset = config.duplicate_offset,
        pretty = config.pretty,
        "Editor configuration loaded"
    );
}

/// One status line on stdout: `label ... value`.
pub fn log_status(label: &str, value: impl std::fmt::Display, ok: bool) {
    let value = value.to_string();
    let value = if ok { value.green() } else { value.red() };
    println!("{:<14} {}", label.bold(), value);
}
