//! Console logging for hosts that do not bring their own `log` backend.

use crate::settings::{LogLevel, WorkerSettings};
use env_filter::Builder as EnvFilterBuilder;

/// Picks the filter directives for console output.
///
/// A non-empty, parseable `RUST_LOG` value wins. Anything else falls back to
/// `default_level`; the second element carries the rejected value and the
/// parse error so the caller can warn once a logger exists.
fn resolve_filter_spec(
    rust_log: Option<&str>,
    default_level: LogLevel,
) -> (String, Option<String>) {
    let fallback = log::LevelFilter::from(default_level).to_string();

    match rust_log {
        Some(spec) if !spec.trim().is_empty() => {
            let mut builder = EnvFilterBuilder::new();
            match builder.try_parse(spec) {
                Ok(_) => (spec.to_string(), None),
                Err(err) => (fallback, Some(format!("'{}': {}", spec, err))),
            }
        }
        _ => (fallback, None),
    }
}

/// Installs an `env_logger` console logger.
///
/// Calling this when a logger is already installed is a no-op, so tests and
/// embedding applications can call it freely.
pub fn init(settings: &WorkerSettings) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (spec, rejected) = resolve_filter_spec(rust_log.as_deref(), settings.log_level);

    let installed = env_logger::Builder::new()
        .parse_filters(&spec)
        .format_timestamp(None)
        .format_target(false)
        .try_init()
        .is_ok();

    if let Some(rejected) = rejected {
        log::warn!(
            "Ignoring invalid RUST_LOG value {}. Falling back to {}-level console logging",
            rejected,
            spec
        );
    }

    if installed {
        log::debug!("Console logging initialised with filter '{}'", spec);
    }
}
