//! The public error handle.
//!
//! `ErrorHandle` is what crosses the API boundary. It owns at most one
//! [`ErrorState`] and is safe to query at any point in its life:
//!
//! - **Empty** (fresh handle, or assigned from an empty one): every query
//!   answers "success, no error"; only [`is_valid`](ErrorHandle::is_valid)
//!   can tell it apart from an explicit success
//! - **Occupied**: queries forward to the owned state
//!
//! Every mutator goes through [`materialize`](ErrorHandle::materialize),
//! so the empty → occupied transition happens in exactly one place.
//! [`clear`](ErrorHandle::clear) is the exception: it resets an occupied
//! state in place and never materializes an empty one.
//!
//! # Value Semantics
//!
//! Clones are deep. Two handles never share a state, so mutating one is
//! never visible through another.
//!
//! ```rust
//! use dbgapi_error::ErrorHandle;
//!
//! let mut a = ErrorHandle::new();
//! a.set_error_string("disk full");
//!
//! let b = a.clone();
//! a.clear();
//!
//! assert!(a.success());
//! assert!(b.fail());
//! assert_eq!(b.to_string(), "error: disk full");
//! ```

use crate::codes::{ErrorType, NO_ERROR, last_os_code};
use crate::logging::{LogCategory, api_log};
use crate::status::ErrorState;
use std::fmt;
use std::io;
use std::ptr;

/// Text written by [`ErrorHandle::get_description`] for an empty handle.
pub const NO_STATE_DESCRIPTION: &str = "error: <no state>";

/// Text written by [`ErrorHandle::get_description`] for a success state.
pub const SUCCESS_DESCRIPTION: &str = "success";

/// Value-semantic, lazily allocated error handle.
#[derive(Default)]
pub struct ErrorHandle {
    state: Option<Box<ErrorState>>,
}

impl ErrorHandle {
    /// An empty handle.
    #[inline]
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Address of the owned state for log lines, null when empty.
    #[inline]
    fn state_addr(&self) -> *const ErrorState {
        self.state.as_deref().map_or(ptr::null(), ptr::from_ref)
    }

    /// Occupy the slot if it is empty and return the owned state.
    pub fn materialize(&mut self) -> &mut ErrorState {
        self.state.get_or_insert_with(|| {
            let state = Box::new(ErrorState::new());
            api_log!(
                LogCategory::State,
                "ErrorHandle({:p})::materialize()",
                &*state as *const ErrorState
            );
            state
        })
    }

    /// The owned state, if any.
    #[inline]
    pub fn state(&self) -> Option<&ErrorState> {
        self.state.as_deref()
    }

    /// Whether a state has ever been constructed in this handle.
    ///
    /// Independent of whether that state is success or failure.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.state.is_some()
    }

    /// True for an empty handle or a success state.
    pub fn success(&self) -> bool {
        let ret = self.state.as_deref().is_none_or(ErrorState::success);
        api_log!(
            LogCategory::Api,
            "ErrorHandle({:p})::success() => {}",
            self.state_addr(),
            ret
        );
        ret
    }

    /// False for an empty handle, otherwise the state's failure predicate.
    pub fn fail(&self) -> bool {
        let ret = self.state.as_deref().is_some_and(ErrorState::fail);
        api_log!(
            LogCategory::Api,
            "ErrorHandle({:p})::fail() => {}",
            self.state_addr(),
            ret
        );
        ret
    }

    /// The numeric code, `0` when empty.
    pub fn error_code(&self) -> u32 {
        let code = self.state.as_deref().map_or(NO_ERROR, ErrorState::code);
        api_log!(
            LogCategory::Api,
            "ErrorHandle({:p})::error_code() => 0x{:08x}",
            self.state_addr(),
            code
        );
        code
    }

    /// The category tag, `Invalid` when empty.
    pub fn error_type(&self) -> ErrorType {
        let kind = self.state.as_deref().map_or(ErrorType::Invalid, ErrorState::kind);
        api_log!(
            LogCategory::Api,
            "ErrorHandle({:p})::error_type() => {}",
            self.state_addr(),
            kind
        );
        kind
    }

    /// Human-readable text of a failure.
    ///
    /// `None` when empty or successful. The text is owned by the state and
    /// borrowed from the handle, so it cannot outlive the next mutation.
    #[inline]
    pub fn error_str(&self) -> Option<&str> {
        self.state.as_deref().and_then(ErrorState::message)
    }

    /// Reset an occupied state to success in place. No-op when empty.
    pub fn clear(&mut self) {
        if let Some(state) = self.state.as_deref_mut() {
            state.clear();
        }
    }

    /// Set code and category, discarding any message.
    pub fn set_error(&mut self, code: u32, kind: ErrorType) {
        self.materialize().set_code(code, kind);
    }

    /// Replace the content with a copy of `state`.
    pub fn set_error_from_state(&mut self, state: &ErrorState) {
        self.materialize().clone_from(state);
    }

    /// Snapshot the calling thread's last OS error.
    ///
    /// Reads ambient OS state: the result depends on whatever system call
    /// last failed on this thread.
    pub fn set_error_to_system_default(&mut self) {
        // Read before materialize(): a sink reacting to its log line may clobber errno
        self.set_error_to_os_code(last_os_code());
    }

    /// Store an OS error value read by the caller.
    pub(crate) fn set_error_to_os_code(&mut self, raw: i32) {
        self.materialize().set_os_code(raw);
    }

    /// Set the catch-all generic failure, discarding any message.
    pub fn set_error_to_generic_error(&mut self) {
        self.materialize().set_to_generic();
    }

    /// Adopt an I/O error, keeping its raw OS code when it has one.
    pub fn set_error_from_io(&mut self, err: &io::Error) {
        self.materialize().clone_from(&ErrorState::from(err));
    }

    /// Store `text` as the message.
    ///
    /// A success state becomes a generic failure first; an existing
    /// failure keeps its code. Empty text only clears the message.
    pub fn set_error_string(&mut self, text: &str) {
        self.materialize().set_message(text);
    }

    /// Format `args` into the message.
    ///
    /// Returns the byte length of the formatted text, or `-1` if
    /// formatting failed. The return describes the formatting only, not
    /// the error the handle now holds.
    ///
    /// ```rust
    /// use dbgapi_error::ErrorHandle;
    ///
    /// let mut handle = ErrorHandle::new();
    /// let written = handle.set_error_string_with_format(format_args!("bad offset {}", 42));
    /// assert_eq!(written, 13);
    /// assert_eq!(handle.error_str(), Some("bad offset 42"));
    /// ```
    pub fn set_error_string_with_format(&mut self, args: fmt::Arguments<'_>) -> i32 {
        self.materialize().set_message_fmt(args)
    }

    /// Render a description into `sink`.
    ///
    /// Writes `success`, `error: <text>`, or `error: <no state>` for an
    /// empty handle. Always returns `true`; sink write failures are the
    /// sink's business.
    pub fn get_description<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> bool {
        let _ = self.write_description(sink);
        true
    }

    fn write_description<W: fmt::Write + ?Sized>(&self, sink: &mut W) -> fmt::Result {
        match self.state.as_deref() {
            Some(state) if state.success() => sink.write_str(SUCCESS_DESCRIPTION),
            Some(state) => write!(sink, "error: {}", state.message().unwrap_or("")),
            None => sink.write_str(NO_STATE_DESCRIPTION),
        }
    }

    /// `Ok(())` unless the handle holds a failure.
    pub fn to_result(&self) -> crate::Result<()> {
        match self.state.as_deref() {
            Some(state) if state.fail() => Err(state.clone()),
            _ => Ok(()),
        }
    }

    /// Return to the empty state, dropping any owned state.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.take() {
            api_log!(
                LogCategory::State,
                "ErrorHandle({:p})::reset()",
                &*state as *const ErrorState
            );
        }
    }
}

impl Clone for ErrorHandle {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }

    /// Assignment: reuse the destination's allocation when both sides are
    /// occupied; an empty source empties the destination.
    fn clone_from(&mut self, source: &Self) {
        match source.state.as_deref() {
            Some(src) => match self.state.as_deref_mut() {
                Some(dst) => dst.clone_from(src),
                None => self.state = Some(Box::new(src.clone())),
            },
            None => self.reset(),
        }
    }
}

impl From<ErrorState> for ErrorHandle {
    fn from(state: ErrorState) -> Self {
        Self {
            state: Some(Box::new(state)),
        }
    }
}

impl From<&io::Error> for ErrorHandle {
    fn from(err: &io::Error) -> Self {
        Self::from(ErrorState::from(err))
    }
}

impl<T> From<crate::Result<T>> for ErrorHandle {
    /// `Ok` becomes an occupied success state, `Err` its failure.
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(_) => Self::from(ErrorState::new()),
            Err(state) => Self::from(state),
        }
    }
}

impl fmt::Display for ErrorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_description(f)
    }
}

impl fmt::Debug for ErrorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandle").field("state", &self.state).finish()
    }
}
