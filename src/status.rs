//! The error state carried behind an [`ErrorHandle`](crate::ErrorHandle).
//!
//! An `ErrorState` is a plain value: a numeric code, the category that
//! gives the code meaning, and an optional message. It is always fully
//! formed; there is no "empty" state here, only success (code zero).
//!
//! # Deferred Description
//!
//! A failing state with no explicit message still has something to say.
//! The default text (OS error text, Mach code, or "unknown error") is not
//! computed when the code is set. It is rendered on the first call to
//! [`ErrorState::message`] and cached until the next mutation.
//!
//! # Memory Hygiene
//!
//! Messages may contain paths, symbol names, or user-supplied expressions.
//! Message buffers are zeroized when replaced, cleared, and dropped.

use crate::codes::{self, ErrorType, GENERIC_ERROR, NO_ERROR};
use std::error::Error;
use std::fmt::{self, Write as _};
use std::io;
use std::sync::OnceLock;
use zeroize::Zeroize;

/// Longest formatted message whose length the formatted setter can report.
const MAX_MESSAGE_LEN: usize = i32::MAX as usize;

/// Code, category and message for one error.
#[derive(Clone, Default)]
pub struct ErrorState {
    code: u32,
    kind: ErrorType,
    message: String,
    rendered: OnceLock<String>,
}

impl ErrorState {
    /// A success state: code zero, category `Invalid`, no message.
    #[inline]
    pub const fn new() -> Self {
        Self {
            code: NO_ERROR,
            kind: ErrorType::Invalid,
            message: String::new(),
            rendered: OnceLock::new(),
        }
    }

    /// A state holding `code` under `kind`.
    pub fn with_code(code: u32, kind: ErrorType) -> Self {
        let mut state = Self::new();
        state.set_code(code, kind);
        state
    }

    /// A generic failure carrying `message`.
    pub fn with_message(message: &str) -> Self {
        let mut state = Self::new();
        state.set_message(message);
        state
    }

    /// Snapshot of the calling thread's last OS error.
    pub fn from_system_default() -> Self {
        let mut state = Self::new();
        state.set_to_system_default();
        state
    }

    /// True when the code is nonzero.
    #[inline]
    pub const fn fail(&self) -> bool {
        self.code != NO_ERROR
    }

    /// True when the code is zero.
    #[inline]
    pub const fn success(&self) -> bool {
        self.code == NO_ERROR
    }

    /// Numeric code, meaningful together with [`kind`](Self::kind).
    #[inline]
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Category giving the code its meaning.
    #[inline]
    pub const fn kind(&self) -> ErrorType {
        self.kind
    }

    /// The explicitly stored message, without the deferred default.
    #[inline]
    pub fn raw_message(&self) -> Option<&str> {
        if self.message.is_empty() {
            None
        } else {
            Some(&self.message)
        }
    }

    /// Human-readable text for a failing state.
    ///
    /// `None` on success. Otherwise the stored message, or the category's
    /// default description rendered on first use.
    pub fn message(&self) -> Option<&str> {
        if self.success() {
            return None;
        }
        if !self.message.is_empty() {
            return Some(&self.message);
        }
        let rendered = self
            .rendered
            .get_or_init(|| codes::describe_code(self.code, self.kind).into_owned());
        Some(rendered.as_str())
    }

    /// Reset to success, zeroizing any message.
    pub fn clear(&mut self) {
        self.code = NO_ERROR;
        self.kind = ErrorType::Invalid;
        self.clear_message();
    }

    /// Set code and category, discarding the message.
    pub fn set_code(&mut self, code: u32, kind: ErrorType) {
        self.code = code;
        self.kind = kind;
        self.clear_message();
    }

    /// Take the thread's last OS error.
    ///
    /// A zero error leaves the state at success with category `Invalid`.
    pub fn set_to_system_default(&mut self) {
        self.set_os_code(codes::last_os_code());
    }

    /// Set the catch-all generic failure, discarding the message.
    pub fn set_to_generic(&mut self) {
        self.set_code(GENERIC_ERROR, ErrorType::Generic);
    }

    /// Store `text` as the message.
    ///
    /// Empty text only clears the message. Non-empty text on a success
    /// state turns it into a generic failure first; an existing failure
    /// keeps its code and category.
    pub fn set_message(&mut self, text: &str) {
        if text.is_empty() {
            self.clear_message();
            return;
        }
        if self.success() {
            self.set_to_generic();
        }
        self.replace_message(text.to_owned());
    }

    /// Format `args` into the message.
    ///
    /// Returns the byte length of the formatted text, `0` for an empty
    /// template (which only clears the message), or `-1` when a `Display`
    /// impl fails or the length does not fit an `i32`. Either failure
    /// leaves a generic failure with no message.
    pub fn set_message_fmt(&mut self, args: fmt::Arguments<'_>) -> i32 {
        if args.as_str() == Some("") {
            self.clear_message();
            return 0;
        }
        if self.success() {
            self.set_to_generic();
        }

        let mut formatted = String::new();
        if formatted.write_fmt(args).is_err() {
            formatted.zeroize();
            self.clear_message();
            return -1;
        }

        self.store_formatted(formatted, MAX_MESSAGE_LEN)
    }

    /// Keep `formatted` if its length fits `limit`, otherwise wipe it.
    fn store_formatted(&mut self, mut formatted: String, limit: usize) -> i32 {
        match i32::try_from(formatted.len()) {
            Ok(written) if formatted.len() <= limit => {
                self.replace_message(formatted);
                written
            }
            _ => {
                formatted.zeroize();
                self.clear_message();
                -1
            }
        }
    }

    /// Adopt a raw OS error value under the host's native category.
    pub(crate) fn set_os_code(&mut self, raw: i32) {
        if raw == 0 {
            self.set_code(NO_ERROR, ErrorType::Invalid);
        } else {
            // Win32 error values are DWORDs; keep their bit pattern
            self.set_code(raw as u32, ErrorType::native_os());
        }
    }

    fn replace_message(&mut self, text: String) {
        self.message.zeroize();
        self.message = text;
        self.reset_rendered();
    }

    fn clear_message(&mut self) {
        self.message.zeroize();
        self.reset_rendered();
    }

    fn reset_rendered(&mut self) {
        if let Some(mut rendered) = self.rendered.take() {
            rendered.zeroize();
        }
    }
}

impl PartialEq for ErrorState {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.kind == other.kind && self.message == other.message
    }
}

impl Eq for ErrorState {}

impl fmt::Debug for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorState")
            .field("code", &self.code)
            .field("kind", &self.kind)
            .field("message", &self.raw_message())
            .finish()
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(text) => f.write_str(text),
            None => f.write_str("success"),
        }
    }
}

impl Error for ErrorState {}

impl From<&io::Error> for ErrorState {
    /// OS errors keep their raw code; anything else becomes a generic
    /// failure carrying the error's text.
    fn from(err: &io::Error) -> Self {
        let mut state = Self::new();
        match err.raw_os_error() {
            Some(raw) if raw != 0 => state.set_os_code(raw),
            _ => state.set_message(&err.to_string()),
        }
        state
    }
}

impl From<io::Error> for ErrorState {
    fn from(err: io::Error) -> Self {
        Self::from(&err)
    }
}

impl Zeroize for ErrorState {
    fn zeroize(&mut self) {
        self.clear();
    }
}

impl Drop for ErrorState {
    fn drop(&mut self) {
        self.zeroize();
    }
}
