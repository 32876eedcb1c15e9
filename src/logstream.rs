// ABOUTME: Per-function deploy-log sinks, teed through tracing.
// ABOUTME: Sinks outlive the create call so reads can drain pending entries.

use crate::config::{FunctionIdentity, LogEntry, LogLevel};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Buffer of structured deploy-log entries for one function.
#[derive(Default)]
pub struct LogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LogSink {
    fn push(&self, level: LogLevel, message: String) {
        self.entries.lock().push(LogEntry {
            time: Utc::now(),
            level,
            message,
        });
    }

    /// Take all pending entries, leaving the sink empty.
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Registry of deploy-log sinks keyed by function identity.
///
/// A sink is created when a deploy starts and persists until the function is
/// deleted, so `get_functions` can drain entries written after the create
/// call returned.
#[derive(Default)]
pub struct LogStreamRegistry {
    sinks: Mutex<HashMap<String, Arc<LogSink>>>,
}

impl LogStreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the sink for a function.
    pub fn sink_for(&self, identity: &FunctionIdentity) -> Arc<LogSink> {
        self.sinks
            .lock()
            .entry(identity.to_string())
            .or_default()
            .clone()
    }

    /// Drain pending entries for a function, if it has a sink.
    pub fn drain(&self, identity: &FunctionIdentity) -> Vec<LogEntry> {
        let sink = self.sinks.lock().get(&identity.to_string()).cloned();
        sink.map(|s| s.drain()).unwrap_or_default()
    }

    /// Drop the sink for a deleted function.
    pub fn remove(&self, identity: &FunctionIdentity) {
        self.sinks.lock().remove(&identity.to_string());
    }
}

/// Logger handle used throughout a deploy.
///
/// Every entry goes into the function's sink and out through `tracing`, so
/// callers watching the stream and operators watching the process log see
/// the same sequence.
#[derive(Clone)]
pub struct DeployLogger {
    function: String,
    sink: Arc<LogSink>,
}

impl DeployLogger {
    pub fn new(identity: &FunctionIdentity, sink: Arc<LogSink>) -> Self {
        Self {
            function: identity.to_string(),
            sink,
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(function = %self.function, "{}", message);
        self.sink.push(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(function = %self.function, "{}", message);
        self.sink.push(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(function = %self.function, "{}", message);
        self.sink.push(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(function = %self.function, "{}", message);
        self.sink.push(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FunctionMeta;

    fn identity() -> FunctionIdentity {
        FunctionMeta {
            name: "echo".to_string(),
            ..Default::default()
        }
        .identity()
        .unwrap()
    }

    #[test]
    fn sink_survives_logger() {
        let registry = LogStreamRegistry::new();
        let identity = identity();
        {
            let logger = DeployLogger::new(&identity, registry.sink_for(&identity));
            logger.info("deploying");
            logger.warn("slow image pull");
        }
        let entries = registry.drain(&identity);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "deploying");
        assert_eq!(entries[1].level, LogLevel::Warn);
    }

    #[test]
    fn drain_empties_the_sink() {
        let registry = LogStreamRegistry::new();
        let identity = identity();
        let logger = DeployLogger::new(&identity, registry.sink_for(&identity));
        logger.info("one");
        assert_eq!(registry.drain(&identity).len(), 1);
        assert!(registry.drain(&identity).is_empty());
    }

    #[test]
    fn same_identity_shares_a_sink() {
        let registry = LogStreamRegistry::new();
        let identity = identity();
        let a = registry.sink_for(&identity);
        let b = registry.sink_for(&identity);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
