use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Only the most recent entries are retained, newest first.
pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

/// Append-only event log collaborator. Entries are mirrored to `tracing` and
/// kept in a capped newest-first buffer for display.
pub struct EventLog {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(LOG_CAPACITY)),
        }
    }

    pub fn log(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Info | Severity::Success => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }

        let mut entries = self.entries.lock().expect("event log mutex poisoned");
        entries.push_front(LogEntry {
            timestamp: Utc::now(),
            message,
            severity,
        });
        entries.truncate(LOG_CAPACITY);
    }

    /// Snapshot of retained entries, newest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .expect("event log mutex poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_comes_first() {
        let log = EventLog::new();
        log.log("first", Severity::Info);
        log.log("second", Severity::Warning);

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "second");
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[1].message, "first");
        assert!(entries[0].timestamp >= entries[1].timestamp);
    }

    #[test]
    fn capped_at_capacity() {
        let log = EventLog::new();
        for i in 0..(LOG_CAPACITY + 25) {
            log.log(format!("entry {i}"), Severity::Info);
        }

        let entries = log.entries();
        assert_eq!(entries.len(), LOG_CAPACITY);
        assert_eq!(entries[0].message, format!("entry {}", LOG_CAPACITY + 24));
        assert_eq!(entries.last().unwrap().message, "entry 25");
    }
}
