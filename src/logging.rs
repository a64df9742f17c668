//! API log side channel.
//!
//! Handle queries can report their results to a [`LogSink`] for tracing
//! how external code drives the API. The channel is strictly best-effort:
//!
//! - No sink installed behaves exactly like a disabled sink
//! - Lines are only formatted when the sink says the category is enabled
//! - A sink can never fail the operation that logged through it
//!
//! # Installation
//!
//! Sinks are installed per thread, the same way the handle itself is used
//! from one thread at a time. Install one with [`install_log_sink`] and
//! remove it with [`clear_log_sink`].
//!
//! ```rust
//! use dbgapi_error::{ErrorHandle, LogCategory, RingBufferSink, install_log_sink, clear_log_sink};
//! use std::sync::Arc;
//!
//! let sink = RingBufferSink::new(16, 256).with_categories(&[LogCategory::Api]);
//! install_log_sink(Arc::new(sink.clone()));
//!
//! let handle = ErrorHandle::new();
//! assert!(!handle.fail());
//!
//! assert_eq!(sink.len(), 1);
//! assert!(sink.get_recent(1)[0].line.contains("fail() => false"));
//! clear_log_sink();
//! ```

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Maximum length of one emitted line (DoS prevention)
pub const MAX_LINE_LEN: usize = 1024;

/// Truncation indicator appended to truncated lines
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// What kind of event a log line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Results of handle queries (`fail`, `success`, `error_code`, `error_type`)
    Api,
    /// Ownership slot transitions (materialize, reset to empty)
    State,
}

impl LogCategory {
    /// All categories.
    pub const ALL: [LogCategory; 2] = [Self::Api, Self::State];

    /// `log` target used when bridging to the facade.
    #[inline]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Api => "dbgapi::api",
            Self::State => "dbgapi::state",
        }
    }

    #[inline]
    pub(crate) const fn bit(self) -> u8 {
        match self {
            Self::Api => 0b01,
            Self::State => 0b10,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Api => "api",
            Self::State => "state",
        })
    }
}

/// Write-only destination for API log lines.
///
/// Implementations must not panic and must not block for long; the
/// caller is in the middle of an API call and ignores the outcome.
pub trait LogSink: Send + Sync {
    /// Whether lines of `category` should be produced at all.
    fn is_enabled(&self, category: LogCategory) -> bool;

    /// Record one formatted line.
    fn emit(&self, category: LogCategory, line: &str);
}

thread_local! {
    static LOG_SINK: RefCell<Option<Arc<dyn LogSink>>> = const { RefCell::new(None) };
}

/// Install `sink` for the calling thread, replacing any previous sink.
pub fn install_log_sink(sink: Arc<dyn LogSink>) {
    let _ = LOG_SINK.try_with(|slot| {
        if let Ok(mut slot) = slot.try_borrow_mut() {
            *slot = Some(sink);
        }
    });
}

/// Remove the calling thread's sink, returning it if one was installed.
pub fn clear_log_sink() -> Option<Arc<dyn LogSink>> {
    LOG_SINK
        .try_with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
        .ok()
        .flatten()
}

/// Whether the calling thread has a sink installed.
pub fn log_sink_installed() -> bool {
    current_sink().is_some()
}

fn current_sink() -> Option<Arc<dyn LogSink>> {
    LOG_SINK
        .try_with(|slot| slot.try_borrow().ok().and_then(|slot| slot.clone()))
        .ok()
        .flatten()
}

/// Emit a line built by `line` if the thread's sink wants `category`.
///
/// The sink is cloned out of the thread-local slot before emitting so a
/// sink that itself touches the API cannot trip over the slot borrow.
pub(crate) fn emit_with(category: LogCategory, line: impl FnOnce() -> String) {
    let Some(sink) = current_sink() else {
        return;
    };
    if !sink.is_enabled(category) {
        return;
    }
    let line = line();
    sink.emit(category, &truncate_with_indicator(&line));
}

/// Log an API event through the thread's sink.
///
/// Arguments are only formatted when the category is enabled.
macro_rules! api_log {
    ($category:expr, $($arg:tt)+) => {
        $crate::logging::emit_with($category, || format!($($arg)+))
    };
}
pub(crate) use api_log;

/// Bridge into the `log` facade.
///
/// Lines go out at `Debug` level under [`LogCategory::target`], so the
/// usual `RUST_LOG=dbgapi::api=debug` style filtering applies.
#[cfg(feature = "log")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacadeSink;

#[cfg(feature = "log")]
impl LogSink for LogFacadeSink {
    fn is_enabled(&self, category: LogCategory) -> bool {
        log::log_enabled!(target: category.target(), log::Level::Debug)
    }

    fn emit(&self, category: LogCategory, line: &str) {
        log::debug!(target: category.target(), "{line}");
    }
}

/// Truncate a line to [`MAX_LINE_LEN`] on a UTF-8 boundary.
///
/// Returns a Cow to avoid allocation when no truncation is needed.
pub(crate) fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_LINE_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_LINE_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
