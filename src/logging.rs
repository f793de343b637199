//! Logging setup.
//!
//! `RUST_LOG` wins when set; otherwise `warn`, or `debug` with `--verbose`.
//! The one-shot report logs to stderr. The dashboard owns the terminal, so
//! it logs to a file instead.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(verbose: bool, target: LogTarget<'_>) -> Result<()> {
    let filter = env_filter(verbose);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_verbose_filter_level() {
        // only meaningful without RUST_LOG overriding the default
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(env_filter(true).max_level_hint(), Some(LevelFilter::DEBUG));
            assert_eq!(env_filter(false).max_level_hint(), Some(LevelFilter::WARN));
        }
    }
}
