use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Name given to the producer thread, also used in fault reports.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Console level used when `RUST_LOG` is unset or unusable.
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            log_level: LogLevel::default(),
        }
    }
}

fn default_thread_name() -> String {
    "transcription-worker".to_string()
}

/// Reads settings from a JSON file.
///
/// A missing file yields the defaults. A file that exists but does not parse
/// is reported and replaced by the defaults as well; only I/O failures other
/// than "not found" are returned as errors.
pub fn load_settings(path: &Path) -> Result<WorkerSettings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(WorkerSettings::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read settings from {:?}", path))
        }
    };

    match serde_json::from_str::<WorkerSettings>(&raw) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!("Failed to parse settings {:?}: {}. Using defaults", path, e);
            Ok(WorkerSettings::default())
        }
    }
}

pub fn write_settings(path: &Path, settings: &WorkerSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("failed to write settings to {:?}", path))
}
