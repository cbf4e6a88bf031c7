//! # Leveled Logger
//!
//! The engine does not reach for a global logger. A [`CalcLogger`] handle is
//! passed to [`Calculator::new`](crate::calculator::Calculator::new) and every
//! engine event goes through it.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryLogger`] keeps the most recent entries in a bounded ring buffer
//!   and mirrors each one as a `tracing` event, so a subscriber installed by
//!   the host application sees the same messages.
//! - [`NullLogger`] drops everything.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use calc_core::logger::{CalcLogger, LoggerConfig, MemoryLogger};
//!
//! let logger = Arc::new(MemoryLogger::new(LoggerConfig::default()));
//! logger.info("session started", None);
//! assert_eq!(logger.entries().len(), 1);
//!
//! let json = logger.export_logs();
//! assert!(json.contains("session started"));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log entry, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// A single recorded log message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Optional structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Settings for [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Entries below this level are discarded
    pub min_level: LogLevel,

    /// Ring buffer capacity; the oldest entry is dropped past this
    pub max_entries: usize,

    /// Re-emit each accepted entry as a `tracing` event
    pub mirror_to_tracing: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            min_level: LogLevel::Debug,
            max_entries: 1000,
            mirror_to_tracing: true,
        }
    }
}

/// Logging collaborator injected into the calculator engine.
///
/// Methods take `&self` so one handle can be shared between several engines
/// (`Arc<MemoryLogger>` coerces to `Arc<dyn CalcLogger>`).
pub trait CalcLogger: Send + Sync {
    /// Record a message with optional structured data
    fn log(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>);

    /// Snapshot of the retained entries, oldest first
    fn entries(&self) -> Vec<LogEntry>;

    /// Drop all retained entries
    fn clear(&self);

    /// Retained entries as a pretty-printed JSON array
    fn export_logs(&self) -> String {
        serde_json::to_string_pretty(&self.entries()).unwrap_or_else(|_| "[]".to_string())
    }

    fn debug(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Debug, message, data);
    }

    fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Info, message, data);
    }

    fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Warn, message, data);
    }

    fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(LogLevel::Error, message, data);
    }
}

/// Bounded in-memory logger with `tracing` mirroring.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    config: LoggerConfig,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl MemoryLogger {
    pub fn new(config: LoggerConfig) -> Self {
        MemoryLogger {
            entries: Mutex::new(VecDeque::with_capacity(config.max_entries.min(1024))),
            config,
        }
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mirror(entry: &LogEntry) {
        let data = entry.data.as_ref().map(|d| d.to_string()).unwrap_or_default();
        match entry.level {
            LogLevel::Debug => tracing::debug!(data = %data, "{}", entry.message),
            LogLevel::Info => tracing::info!(data = %data, "{}", entry.message),
            LogLevel::Warn => tracing::warn!(data = %data, "{}", entry.message),
            LogLevel::Error => tracing::error!(data = %data, "{}", entry.message),
        }
    }
}

impl CalcLogger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
        if level < self.config.min_level {
            return;
        }

        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            data,
        };

        if self.config.mirror_to_tracing {
            Self::mirror(&entry);
        }

        if self.config.max_entries == 0 {
            return;
        }

        let mut entries = self.lock();
        entries.push_back(entry);
        while entries.len() > self.config.max_entries {
            entries.pop_front();
        }
    }

    fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

/// Logger that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl CalcLogger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str, _data: Option<serde_json::Value>) {}

    fn entries(&self) -> Vec<LogEntry> {
        Vec::new()
    }

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiet_logger(max_entries: usize) -> MemoryLogger {
        MemoryLogger::new(LoggerConfig {
            max_entries,
            mirror_to_tracing: false,
            ..LoggerConfig::default()
        })
    }

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let logger = quiet_logger(3);
        for i in 0..5 {
            logger.info(&format!("message {}", i), None);
        }

        let messages: Vec<_> = logger.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn test_min_level_filters() {
        let logger = MemoryLogger::new(LoggerConfig {
            min_level: LogLevel::Warn,
            mirror_to_tracing: false,
            ..LoggerConfig::default()
        });
        logger.debug("ignored", None);
        logger.info("ignored", None);
        logger.warn("kept", None);
        logger.error("kept", None);
        assert_eq!(logger.len(), 2);
    }

    #[test]
    fn test_export_logs_is_json_array() {
        let logger = quiet_logger(10);
        logger.error("Division by zero", Some(json!({ "left": 15.0 })));

        let exported = logger.export_logs();
        let parsed: Vec<LogEntry> = serde_json::from_str(&exported).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].level, LogLevel::Error);
        assert_eq!(parsed[0].data, Some(json!({ "left": 15.0 })));
        assert!(exported.contains("\"level\": \"error\""));
    }

    #[test]
    fn test_clear() {
        let logger = quiet_logger(10);
        logger.info("one", None);
        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let logger = quiet_logger(0);
        logger.error("dropped", None);
        assert!(logger.is_empty());
    }

    #[test]
    fn test_null_logger() {
        let logger = NullLogger;
        logger.error("nothing", None);
        assert!(logger.entries().is_empty());
        assert_eq!(logger.export_logs(), "[]");
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
