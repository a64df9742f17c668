//! Convenience macros for formatted error messages.
//!
//! ```rust
//! use dbgapi_error::{ErrorHandle, set_error_fmt};
//!
//! let mut handle = ErrorHandle::new();
//! let written = set_error_fmt!(handle, "bad offset {}", 42);
//! assert_eq!(written, 13);
//! assert_eq!(handle.error_str(), Some("bad offset 42"));
//! ```

/// Format into a handle's message, `printf` style.
///
/// Expands to [`ErrorHandle::set_error_string_with_format`](crate::ErrorHandle::set_error_string_with_format)
/// and returns its byte count (or `-1` on formatting failure).
#[macro_export]
macro_rules! set_error_fmt {
    ($handle:expr, $($arg:tt)+) => {
        $handle.set_error_string_with_format(::std::format_args!($($arg)+))
    };
}

/// Build an [`ErrorHandle`](crate::ErrorHandle) holding a formatted
/// generic failure.
#[macro_export]
macro_rules! error_handle {
    ($($arg:tt)+) => {{
        let mut handle = $crate::ErrorHandle::new();
        handle.set_error_string_with_format(::std::format_args!($($arg)+));
        handle
    }};
}

#[cfg(test)]
mod tests {
    use crate::{ErrorHandle, ErrorType, GENERIC_ERROR};

    #[test]
    fn set_error_fmt_returns_length() {
        let mut handle = ErrorHandle::new();
        let written = set_error_fmt!(handle, "thread {} stopped at 0x{:x}", 3, 0x1000);
        assert_eq!(written, "thread 3 stopped at 0x1000".len() as i32);
        assert_eq!(handle.error_str(), Some("thread 3 stopped at 0x1000"));
    }

    #[test]
    fn set_error_fmt_keeps_existing_code() {
        let mut handle = ErrorHandle::new();
        handle.set_error(22, ErrorType::Posix);
        set_error_fmt!(handle, "invalid argument {}", "-x");
        assert_eq!(handle.error_code(), 22);
    }

    #[test]
    fn error_handle_macro_builds_generic_failure() {
        let handle = error_handle!("no process with pid {}", 4242);
        assert!(handle.fail());
        assert_eq!(handle.error_code(), GENERIC_ERROR);
        assert_eq!(handle.to_string(), "error: no process with pid 4242");
    }
}
