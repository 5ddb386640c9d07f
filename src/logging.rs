//! Tracing subscriber installation.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{ComposerConfig, DEFAULT_LOG_FILTER};

fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs a global `fmt` subscriber writing to stderr, or to
/// `config.log_file` when set.
///
/// Returns `Ok(false)` when another subscriber is already installed.
pub fn init_logging(config: &ComposerConfig) -> io::Result<bool> {
    let filter = build_filter(&config.log_filter);

    let (file_layer, stderr_layer) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file))
                .with_filter(filter);
            (Some(layer), None)
        }
        None => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(filter);
            (None, Some(layer))
        }
    };

    Ok(tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok())
}
