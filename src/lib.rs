//! # dbgapi-error
//!
//! The error handle exposed at the boundary of a debugger's public API.
//!
//! Code outside the debugger (tools, scripts, bindings in other languages)
//! needs to receive, inspect, and produce errors without depending on how
//! the debugger represents them internally. [`ErrorHandle`] is that
//! boundary type.
//!
//! ## Design Principles
//!
//! 1. **Always safe to query**: a handle that was never written to answers
//!    every question with "success, no error"
//! 2. **Lazy allocation**: the internal [`ErrorState`] only exists once
//!    something writes to the handle
//! 3. **Value semantics**: clones are deep; handles never alias
//! 4. **Deferred formatting**: default error text is rendered on first
//!    request, not when the code is set
//! 5. **Side-channel logging**: API tracing is optional and can never
//!    change an operation's outcome
//!
//! ## Quick Start
//!
//! ```rust
//! use dbgapi_error::{ErrorHandle, ErrorType, Stream};
//!
//! fn attach(pid: u32, error: &mut ErrorHandle) {
//!     if pid == 0 {
//!         error.set_error_string_with_format(format_args!("invalid pid {}", pid));
//!     }
//! }
//!
//! let mut error = ErrorHandle::new();
//! assert!(error.success());
//! assert!(!error.is_valid());
//!
//! attach(0, &mut error);
//! assert!(error.fail());
//!
//! let mut stream = Stream::new();
//! error.get_description(&mut stream);
//! assert_eq!(stream.data(), "error: invalid pid 0");
//!
//! error.set_error(2, ErrorType::Posix);
//! assert_eq!(error.error_code(), 2);
//! ```
//!
//! ## Propagating From Rust Code
//!
//! ```rust
//! use dbgapi_error::{ErrorHandle, Result};
//! use std::fs::File;
//!
//! fn open_core(path: &str) -> Result<File> {
//!     Ok(File::open(path)?)
//! }
//!
//! let handle = ErrorHandle::from(open_core("/no/such/core"));
//! assert!(handle.fail());
//! ```
//!
//! ## Features
//!
//! - `log` (default): [`LogFacadeSink`] bridges API log lines into the `log` facade
//! - `ffi` (default): C ABI surface in [`ffi`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codes;
pub mod convenience;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod handle;
pub mod logging;
pub mod ring_buffer;
pub mod status;
pub mod stream;

pub use codes::*;
pub use handle::*;
pub use logging::{LogCategory, LogSink, clear_log_sink, install_log_sink, log_sink_installed};
#[cfg(feature = "log")]
pub use logging::LogFacadeSink;
pub use ring_buffer::{LogEntry, RingBufferSink};
pub use status::*;
pub use stream::*;

/// Type alias for Results carrying an error state.
pub type Result<T> = std::result::Result<T, ErrorState>;

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Default Construction
    // ========================================================================

    #[test]
    fn default_handle_reports_success() {
        let handle = ErrorHandle::new();
        assert!(!handle.is_valid());
        assert!(handle.success());
        assert!(!handle.fail());
        assert_eq!(handle.error_code(), 0);
    }

    // ========================================================================
    // End-to-End Scenarios
    // ========================================================================

    #[test]
    fn platform_code_scenario() {
        let mut handle = ErrorHandle::new();
        handle.set_error(2, ErrorType::native_os());
        assert_eq!(handle.error_code(), 2);
        assert!(handle.is_valid());
        assert!(handle.fail());

        let text = handle.to_string();
        assert!(text.starts_with("error: "));
        assert!(text.len() > "error: ".len());
    }

    #[test]
    fn formatted_message_scenario() {
        let mut handle = ErrorHandle::new();
        let written = crate::set_error_fmt!(handle, "bad offset {}", 42);
        assert_eq!(written as usize, "bad offset 42".len());
        assert_eq!(handle.error_str(), Some("bad offset 42"));
    }

    #[test]
    fn description_lifecycle() {
        let mut handle = ErrorHandle::new();
        assert_eq!(handle.to_string(), "error: <no state>");

        handle.set_error_string("disk full");
        assert_eq!(handle.to_string(), "error: disk full");

        handle.clear();
        assert_eq!(handle.to_string(), "success");
    }

    #[test]
    fn question_mark_converts_io_errors() {
        fn read_missing() -> Result<Vec<u8>> {
            Ok(std::fs::read("/definitely/not/here/dbgapi")?)
        }

        let err = read_missing().unwrap_err();
        assert!(err.fail());
        assert!(err.message().is_some());
    }

    #[test]
    fn error_state_is_std_error() {
        fn boxed() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Err(Box::new(ErrorState::with_message("attach refused")))
        }
        assert_eq!(boxed().unwrap_err().to_string(), "attach refused");
    }

    #[test]
    fn handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ErrorHandle>();
        assert_send_sync::<ErrorState>();
        assert_send_sync::<RingBufferSink>();
    }
}
