//! Bounded in-memory log buffer shared between the UI and background workers.
//!
//! The buffer is the only multi-writer resource in the system: any number of
//! producer threads call [`LogBuffer::add_entry`] while the log panel and the
//! command runner read snapshots. A single read/write lock guards the backing
//! deque; writers hold the exclusive lock only for the append + evict, readers
//! only for the copy. The lock is never held across I/O.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of entries retained when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Severity level of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Short uppercase label for display, fixed width friendly.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// All levels in ascending severity order.
    pub fn all() -> &'static [LogLevel] {
        &[Self::Debug, Self::Info, Self::Warn, Self::Error]
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One log record. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    pub session_id: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        level: LogLevel,
        component: impl Into<String>,
        message: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            component: component.into(),
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

/// Capacity-bounded, append-only store of log entries, safe for concurrent
/// writers and readers. When a write would exceed the capacity the oldest
/// entries are evicted first, so `len() <= capacity` holds at all times,
/// including under burst writes.
#[derive(Debug)]
pub struct LogBuffer {
    entries: RwLock<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a buffer retaining at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    /// Append an entry, evicting the oldest first when at capacity.
    pub fn add_entry(&self, entry: LogEntry) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            // A poisoned lock means a writer panicked mid-append; the deque
            // itself is still structurally valid, so keep going.
            Err(poisoned) => poisoned.into_inner(),
        };
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of all entries in insertion order. Always a defensive copy;
    /// never an alias into the live buffer.
    pub fn entries(&self) -> Vec<LogEntry> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.iter().cloned().collect()
    }

    /// Entries with a timestamp strictly after `after`, in insertion order.
    /// Falls back to the full buffer when nothing matches, so a consumer
    /// whose clock races ahead of producers never sees an empty screen.
    pub fn entries_after(&self, after: DateTime<Utc>) -> Vec<LogEntry> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let newer: Vec<LogEntry> = entries
            .iter()
            .filter(|e| e.timestamp > after)
            .cloned()
            .collect();
        if newer.is_empty() {
            entries.iter().cloned().collect()
        } else {
            newer
        }
    }

    /// Remove all entries. A write racing a clear lands either before or
    /// after it; the capacity bound is preserved either way.
    pub fn clear(&self) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.clear();
    }

    /// Current number of retained entries.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns true if the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, "test", message, "session-1")
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent() {
        let buffer = LogBuffer::new(3);
        for name in ["A", "B", "C", "D"] {
            buffer.add_entry(entry(name));
        }

        let entries = buffer.entries();
        let messages: Vec<&str> = entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["B", "C", "D"]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_capacity_never_exceeded_under_concurrent_writers() {
        let buffer = Arc::new(LogBuffer::new(50));
        let mut handles = Vec::new();

        for writer in 0..8 {
            let buffer = Arc::clone(&buffer);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    buffer.add_entry(entry(&format!("w{writer}-{i}")));
                }
            }));
        }

        // Readers racing the writers must always observe a bounded,
        // fully-formed snapshot.
        for _ in 0..4 {
            let buffer = Arc::clone(&buffer);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let snapshot = buffer.entries();
                    assert!(snapshot.len() <= 50);
                    for e in &snapshot {
                        assert!(!e.message.is_empty());
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(buffer.len(), 50);
    }

    #[test]
    fn test_entries_returns_defensive_copy() {
        let buffer = LogBuffer::new(4);
        buffer.add_entry(entry("first"));

        let snapshot = buffer.entries();
        buffer.add_entry(entry("second"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_entries_after_filters_strictly() {
        let buffer = LogBuffer::new(10);
        buffer.add_entry(entry("old"));
        let cutoff = buffer.entries()[0].timestamp;

        let mut newer = entry("new");
        newer.timestamp = cutoff + chrono::Duration::milliseconds(5);
        buffer.add_entry(newer);

        let result = buffer.entries_after(cutoff);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].message, "new");
    }

    #[test]
    fn test_entries_after_falls_back_to_full_buffer() {
        let buffer = LogBuffer::new(10);
        buffer.add_entry(entry("only"));

        let future = Utc::now() + chrono::Duration::hours(1);
        let result = buffer.entries_after(future);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].message, "only");
    }

    #[test]
    fn test_clear_races_with_add() {
        let buffer = Arc::new(LogBuffer::new(16));
        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for i in 0..500 {
                    buffer.add_entry(entry(&format!("{i}")));
                }
            })
        };
        for _ in 0..50 {
            buffer.clear();
            assert!(buffer.len() <= 16);
        }
        writer.join().unwrap();
        assert!(buffer.len() <= 16);
    }

    #[test]
    fn test_zero_capacity_clamped_to_one() {
        let buffer = LogBuffer::new(0);
        buffer.add_entry(entry("a"));
        buffer.add_entry(entry("b"));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.entries()[0].message, "b");
    }
}
