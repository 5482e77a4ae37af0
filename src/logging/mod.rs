//! Structured logging for the arena core.
//!
//! All components log through `tracing` with targets under `arena_core::`.
//! Initialization is idempotent so the FFI host, the Bevy plugin and tests can
//! all call it; `RUST_LOG` overrides the configured filter.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Installs the subscriber when added to a Bevy app.
pub struct LoggingPlugin {
    pub config: TracingConfig,
}

impl Default for LoggingPlugin {
    fn default() -> Self {
        Self {
            config: TracingConfig::default(),
        }
    }
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_tracing(&self.config);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Level from the numeric id used across the FFI; unknown ids map to info.
    pub fn from_id(id: u32) -> Self {
        Self::ALL.get(id as usize).copied().unwrap_or(LogLevel::Info)
    }
}

/// Filter and format options for [`init_tracing`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    pub default_level: LogLevel,
    /// Per-target overrides, e.g. `("arena_core::boss", Debug)`
    pub module_filters: Vec<(String, LogLevel)>,
    pub show_targets: bool,
    pub show_thread_ids: bool,
    pub show_file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: LogLevel::Info,
            module_filters: vec![
                ("arena_core::bridge".to_string(), LogLevel::Warn),
                ("arena_core::timer".to_string(), LogLevel::Info),
                ("arena_core::balance".to_string(), LogLevel::Info),
            ],
            show_targets: true,
            show_thread_ids: false,
            show_file_line: false,
        }
    }
}

impl TracingConfig {
    /// Everything at `level`, no per-target overrides.
    pub fn with_level(level: LogLevel) -> Self {
        Self {
            default_level: level,
            module_filters: Vec::new(),
            ..Self::default()
        }
    }

    pub fn to_env_filter_string(&self) -> String {
        std::iter::once(self.default_level.as_str().to_string())
            .chain(
                self.module_filters
                    .iter()
                    .map(|(target, level)| format!("{target}={}", level.as_str())),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

static TRACING_INIT: Once = Once::new();

pub fn init_tracing_default() {
    init_tracing(&TracingConfig::default());
}

/// Install the global subscriber; the first call wins.
pub fn init_tracing(config: &TracingConfig) {
    let filter_str = config.to_env_filter_string();
    let (targets, thread_ids, file_line) = (
        config.show_targets,
        config.show_thread_ids,
        config.show_file_line,
    );
    TRACING_INIT.call_once(move || {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(targets)
            .with_thread_ids(thread_ids)
            .with_file(file_line)
            .with_line_number(file_line)
            .compact();

        // A host (or Bevy's LogPlugin) may already own the global subscriber
        let _ = subscriber.try_init();
    });
}

/// Log on behalf of an FFI host at `level`.
pub fn log_host(level: LogLevel, system: &str, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(target: "arena_core::host", system, "{message}"),
        LogLevel::Debug => tracing::debug!(target: "arena_core::host", system, "{message}"),
        LogLevel::Info => tracing::info!(target: "arena_core::host", system, "{message}"),
        LogLevel::Warn => tracing::warn!(target: "arena_core::host", system, "{message}"),
        LogLevel::Error => tracing::error!(target: "arena_core::host", system, "{message}"),
    }
}

/// Entered span around a long operation such as a balance batch.
pub struct TimingSpan {
    _span: tracing::span::EnteredSpan,
}

impl TimingSpan {
    pub fn new(name: &str) -> Self {
        let span = tracing::info_span!(target: "arena_core::timing", "operation", name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ids() {
        assert_eq!(LogLevel::from_id(0), LogLevel::Trace);
        assert_eq!(LogLevel::from_id(3), LogLevel::Warn);
        assert_eq!(LogLevel::from_id(4), LogLevel::Error);
        assert_eq!(LogLevel::from_id(99), LogLevel::Info);
    }

    #[test]
    fn test_env_filter_string() {
        let filter = TracingConfig::default().to_env_filter_string();
        assert!(filter.starts_with("info"));
        assert!(filter.contains("arena_core::bridge=warn"));

        let quiet = TracingConfig::with_level(LogLevel::Error);
        assert_eq!(quiet.to_env_filter_string(), "error");
    }

    #[test]
    fn test_config_json() {
        let config = TracingConfig::with_level(LogLevel::Debug);
        let restored = TracingConfig::from_json(&config.to_json()).unwrap();
        assert_eq!(restored.default_level, LogLevel::Debug);
        assert!(TracingConfig::from_json("not json").is_none());
    }

    #[test]
    fn test_init_is_idempotent() {
        init_tracing_default();
        init_tracing(&TracingConfig::with_level(LogLevel::Trace));
        log_host(LogLevel::Warn, "test", "still fine");
        let _span = TimingSpan::new("noop");
    }
}
