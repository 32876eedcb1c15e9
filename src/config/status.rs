// ABOUTME: Observed function status: lifecycle state, port, message, logs.
// ABOUTME: Error messages are hard-bounded to keep records storable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard upper bound on a status message (4 MiB).
pub const MESSAGE_LIMIT: usize = 4 * 1024 * 1024;

/// Lifecycle state recorded for a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionState {
    /// Transient: a create call is in flight for this identity.
    Building,
    /// Container exists and reported healthy at deploy time.
    Ready,
    /// Terminal failure; message explains why.
    Error,
}

/// Observed status of a function record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionStatus {
    pub state: FunctionState,

    #[serde(default)]
    pub http_port: Option<u16>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl FunctionStatus {
    pub fn building() -> Self {
        Self {
            state: FunctionState::Building,
            http_port: None,
            message: None,
            logs: Vec::new(),
        }
    }

    pub fn ready(http_port: u16) -> Self {
        Self {
            state: FunctionState::Ready,
            http_port: Some(http_port),
            message: None,
            logs: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: FunctionState::Error,
            http_port: None,
            message: Some(truncate_message(message.into())),
            logs: Vec::new(),
        }
    }
}

/// Severity of a deploy-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One structured entry from a function's deploy-log stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Truncate a message to [`MESSAGE_LIMIT`] bytes on a char boundary.
pub fn truncate_message(mut message: String) -> String {
    if message.len() <= MESSAGE_LIMIT {
        return message;
    }
    let mut end = MESSAGE_LIMIT;
    while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_untouched() {
        assert_eq!(truncate_message("boom".to_string()), "boom");
    }

    #[test]
    fn long_message_bounded() {
        let long = "x".repeat(MESSAGE_LIMIT + 100);
        assert_eq!(truncate_message(long).len(), MESSAGE_LIMIT);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Fill up to just below the limit, then straddle it with multibyte chars.
        let mut s = "x".repeat(MESSAGE_LIMIT - 1);
        s.push_str("ééé");
        let truncated = truncate_message(s);
        assert!(truncated.len() <= MESSAGE_LIMIT);
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn error_status_is_bounded() {
        let status = FunctionStatus::error("y".repeat(MESSAGE_LIMIT * 2));
        assert_eq!(status.message.unwrap().len(), MESSAGE_LIMIT);
    }
}
