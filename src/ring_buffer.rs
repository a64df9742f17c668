// src/ring_buffer.rs
//! Bounded in-memory [`LogSink`] for API tracing.
//!
//! Keeps the most recent API log lines in a fixed-size ring with FIFO
//! eviction. Useful for attaching "what did the client just do" context
//! to a bug report without running a full logging stack.
//!
//! # Design Principles
//!
//! - **Bounded memory**: fixed entry count and per-entry byte cap
//! - **FIFO eviction**: oldest lines dropped first
//! - **RwLock-based**: concurrent readers, exclusive writers
//! - **Cheap clones**: clones share the same buffer
//!
//! # Example
//!
//! ```rust
//! use dbgapi_error::{ErrorHandle, ErrorType, RingBufferSink, install_log_sink, clear_log_sink};
//! use std::sync::Arc;
//!
//! let sink = RingBufferSink::new(64, 256);
//! install_log_sink(Arc::new(sink.clone()));
//!
//! let mut handle = ErrorHandle::new();
//! handle.set_error(2, ErrorType::Posix);
//! let _ = handle.error_code();
//!
//! for entry in sink.get_recent(10) {
//!     println!("[{}] {}", entry.category, entry.line);
//! }
//! clear_log_sink();
//! ```

use crate::logging::{LogCategory, LogSink};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default number of retained lines.
pub const DEFAULT_CAPACITY: usize = 256;

/// Default per-line byte cap.
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 512;

const TRUNCATION_INDICATOR: &str = "...[TRUNC]";

/// One retained log line.
///
/// Uses `Arc<str>` so reads hand out clones without copying text.
#[derive(Clone, Debug)]
pub struct LogEntry {
    /// Unix timestamp of emission
    pub timestamp: u64,
    /// Category the line was emitted under
    pub category: LogCategory,
    /// Line text, truncated to the sink's byte cap
    pub line: Arc<str>,
    /// Stored size in bytes
    pub size_bytes: usize,
}

/// Fixed-size ring buffer with exact allocation (no growth).
struct RingBuffer {
    entries: Box<[Option<LogEntry>]>,
    tail: usize,
    head: usize,
    len: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_with(|| None)
                .take(capacity)
                .collect::<Box<[Option<LogEntry>]>>(),
            tail: 0,
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: LogEntry) -> Option<LogEntry> {
        let evicted = self.entries[self.tail].replace(entry);
        self.tail = (self.tail + 1) % self.entries.len();

        if self.len < self.entries.len() {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % self.entries.len();
        }

        evicted
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        let head = self.head;
        let len = self.len;
        let cap = self.entries.len();

        (0..len).filter_map(move |i| {
            let idx = (head + i) % cap;
            self.entries[idx].as_ref()
        })
    }

    fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Ring buffer log sink with bounded memory usage.
///
/// All categories are recorded unless narrowed with
/// [`with_categories`](Self::with_categories).
pub struct RingBufferSink {
    buffer: Arc<RwLock<RingBuffer>>,
    max_entries: usize,
    max_entry_bytes: usize,
    category_mask: u8,
    eviction_count: Arc<AtomicU64>,
}

impl RingBufferSink {
    /// Create a sink retaining at most `max_entries` lines of at most
    /// `max_entry_bytes` bytes each. A zero entry count is raised to one.
    pub fn new(max_entries: usize, max_entry_bytes: usize) -> Self {
        let bounded_entries = max_entries.max(1);
        Self {
            buffer: Arc::new(RwLock::new(RingBuffer::new(bounded_entries))),
            max_entries: bounded_entries,
            max_entry_bytes,
            category_mask: LogCategory::ALL.iter().fold(0, |mask, c| mask | c.bit()),
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record only the given categories.
    pub fn with_categories(mut self, categories: &[LogCategory]) -> Self {
        self.category_mask = categories.iter().fold(0, |mask, c| mask | c.bit());
        self
    }

    #[inline]
    fn read_buffer(&self) -> RwLockReadGuard<'_, RingBuffer> {
        match self.buffer.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[inline]
    fn write_buffer(&self) -> RwLockWriteGuard<'_, RingBuffer> {
        match self.buffer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a line, evicting the oldest if the buffer is full.
    pub fn record(&self, category: LogCategory, line: &str) {
        let line = truncate_to_bytes(line, self.max_entry_bytes);
        let entry = LogEntry {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            category,
            size_bytes: line.len(),
            line: Arc::from(line.as_ref()),
        };

        let mut buffer = self.write_buffer();
        if buffer.push(entry).is_some() {
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The `count` most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<LogEntry> {
        let buffer = self.read_buffer();
        buffer.iter().rev().take(count).cloned().collect()
    }

    /// All entries, newest first.
    pub fn get_all(&self) -> Vec<LogEntry> {
        let buffer = self.read_buffer();
        buffer.iter().rev().cloned().collect()
    }

    /// Entries matching `predicate`, oldest first.
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<LogEntry>
    where
        F: Fn(&LogEntry) -> bool,
    {
        let buffer = self.read_buffer();
        let matched: SmallVec<[LogEntry; 8]> =
            buffer.iter().filter(|e| predicate(e)).cloned().collect();
        matched.into_vec()
    }

    /// Number of buffered entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.read_buffer().len()
    }

    /// True when no entries are buffered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total stored line bytes.
    pub fn payload_bytes(&self) -> usize {
        let buffer = self.read_buffer();
        buffer.iter().map(|e| e.size_bytes).sum()
    }

    /// Lines dropped to make room since creation.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Drop all retained lines.
    pub fn clear(&self) {
        self.write_buffer().clear();
    }

    /// Maximum number of entries kept.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// True once the next record will evict the oldest entry.
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_entries
    }
}

impl Default for RingBufferSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_MAX_ENTRY_BYTES)
    }
}

impl Clone for RingBufferSink {
    fn clone(&self) -> Self {
        Self {
            buffer: Arc::clone(&self.buffer),
            max_entries: self.max_entries,
            max_entry_bytes: self.max_entry_bytes,
            category_mask: self.category_mask,
            eviction_count: Arc::clone(&self.eviction_count),
        }
    }
}

impl LogSink for RingBufferSink {
    fn is_enabled(&self, category: LogCategory) -> bool {
        self.category_mask & category.bit() != 0
    }

    fn emit(&self, category: LogCategory, line: &str) {
        self.record(category, line);
    }
}

/// Truncate string to maximum byte length, respecting UTF-8 boundaries.
fn truncate_to_bytes(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if max_bytes == 0 {
        return Cow::Borrowed("");
    }
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }

    if max_bytes <= TRUNCATION_INDICATOR.len() {
        return Cow::Borrowed(&TRUNCATION_INDICATOR[..max_bytes]);
    }
    let max_content = max_bytes - TRUNCATION_INDICATOR.len();

    let mut idx = max_content;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut out = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    out.push_str(&s[..idx]);
    out.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest() {
        let sink = RingBufferSink::new(3, 1024);

        for i in 0..5 {
            sink.record(LogCategory::Api, &format!("line {i}"));
        }

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.eviction_count(), 2);

        let entries = sink.get_all();
        assert_eq!(entries[0].line.as_ref(), "line 4");
        assert_eq!(entries[2].line.as_ref(), "line 2");
    }

    #[test]
    fn respects_size_limit() {
        let sink = RingBufferSink::new(10, 64);
        sink.record(LogCategory::Api, &"A".repeat(10_000));

        let entry = &sink.get_recent(1)[0];
        assert!(entry.size_bytes <= 64);
        assert!(entry.line.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let sink = RingBufferSink::new(0, 64);
        assert_eq!(sink.capacity(), 1);
        sink.record(LogCategory::Api, "a");
        sink.record(LogCategory::Api, "b");
        assert!(sink.is_full());
        assert_eq!(sink.get_all()[0].line.as_ref(), "b");
    }

    #[test]
    fn category_mask_filters() {
        let sink = RingBufferSink::default().with_categories(&[LogCategory::State]);
        assert!(sink.is_enabled(LogCategory::State));
        assert!(!sink.is_enabled(LogCategory::Api));

        let all = RingBufferSink::default();
        assert!(all.is_enabled(LogCategory::Api));
        assert!(all.is_enabled(LogCategory::State));
    }

    #[test]
    fn filtering_by_category() {
        let sink = RingBufferSink::new(100, 256);
        for i in 0..10 {
            let category = if i % 2 == 0 { LogCategory::Api } else { LogCategory::State };
            sink.emit(category, &format!("line {i}"));
        }

        let state = sink.get_filtered(|e| e.category == LogCategory::State);
        assert_eq!(state.len(), 5);
        assert_eq!(state[0].line.as_ref(), "line 1");
    }

    #[test]
    fn clone_shares_state() {
        let first = RingBufferSink::new(100, 256);
        let second = first.clone();

        first.record(LogCategory::Api, "shared");

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);

        second.clear();
        assert!(first.is_empty());
    }

    #[test]
    fn payload_bytes_sums_entries() {
        let sink = RingBufferSink::new(10, 256);
        sink.record(LogCategory::Api, "abc");
        sink.record(LogCategory::Api, "de");
        assert_eq!(sink.payload_bytes(), 5);
    }

    #[test]
    fn truncate_respects_utf8() {
        let emoji = "🔥".repeat(100);
        let truncated = truncate_to_bytes(&emoji, 50);

        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
        assert!(truncated.len() <= 50);
    }

    #[test]
    fn truncate_no_allocation_when_short() {
        let truncated = truncate_to_bytes("short", 100);
        assert!(matches!(truncated, Cow::Borrowed("short")));
    }

    #[test]
    fn concurrent_recording() {
        use std::thread;

        let sink = RingBufferSink::new(128, 256);
        let mut handles = Vec::new();

        for i in 0..8 {
            let sink = sink.clone();
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    sink.record(LogCategory::Api, &format!("t{i}-{j}"));
                }
            }));
        }

        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(sink.len(), 128);
        assert_eq!(sink.eviction_count(), 800 - 128);
    }
}
