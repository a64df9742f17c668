//! Error categories and code conventions.
//!
//! Every error carried across the API boundary is a `(code, ErrorType)`
//! pair. The numeric code is only meaningful together with its category:
//! `2` under [`ErrorType::Posix`] is `ENOENT`, while `2` under
//! [`ErrorType::Generic`] is whatever the producing subsystem decided.
//!
//! # Code Conventions
//!
//! - [`NO_ERROR`] (`0`) is success in every category
//! - [`GENERIC_ERROR`] (`u32::MAX`) is the catch-all failure used when a
//!   message is attached to a state that had no code of its own
//!
//! # ABI Stability
//!
//! `ErrorType` is `#[repr(u32)]` and its discriminants are frozen. Bindings
//! in other languages exchange the raw value; [`ErrorType::from_raw`] maps
//! anything unrecognized to [`ErrorType::Invalid`] instead of trusting it.

use std::borrow::Cow;
use std::fmt;

/// Code value meaning "no error".
pub const NO_ERROR: u32 = 0;

/// Catch-all failure code for generic errors.
pub const GENERIC_ERROR: u32 = u32::MAX;

/// Fallback description for failures whose category has no text source.
pub const UNKNOWN_ERROR_TEXT: &str = "unknown error";

/// Category tag classifying where an error code came from.
///
/// # Copy Semantics
///
/// Fieldless `#[repr(u32)]` enum, passed by value everywhere. The raw
/// discriminant is what crosses the C boundary.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorType {
    /// No category assigned (empty handle, cleared state, or zero OS error)
    #[default]
    Invalid = 0,
    /// Debugger-defined error with no external code space
    Generic = 1,
    /// Mach kernel return code (`kern_return_t`)
    MachKernel = 2,
    /// POSIX `errno` value
    Posix = 3,
    /// Expression evaluation failure
    Expression = 4,
    /// Windows `GetLastError()` value
    Win32 = 5,
}

impl ErrorType {
    /// All categories in discriminant order.
    pub const ALL: [ErrorType; 6] = [
        Self::Invalid,
        Self::Generic,
        Self::MachKernel,
        Self::Posix,
        Self::Expression,
        Self::Win32,
    ];

    /// Decode a raw discriminant received across the ABI.
    ///
    /// Unknown values decode to `Invalid` rather than failing.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Generic,
            2 => Self::MachKernel,
            3 => Self::Posix,
            4 => Self::Expression,
            5 => Self::Win32,
            _ => Self::Invalid,
        }
    }

    /// Raw discriminant for the ABI.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    /// Short stable name, used in log lines.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Generic => "generic",
            Self::MachKernel => "mach-kernel",
            Self::Posix => "posix",
            Self::Expression => "expression",
            Self::Win32 => "win32",
        }
    }

    /// True for the categories whose codes belong to a specific OS.
    #[inline]
    pub const fn is_platform_specific(self) -> bool {
        matches!(self, Self::MachKernel | Self::Win32)
    }

    /// The category the host OS reports its last-error value in.
    #[inline]
    pub const fn native_os() -> Self {
        if cfg!(windows) { Self::Win32 } else { Self::Posix }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Render the default human-readable text for a failing code.
///
/// Only called for nonzero codes, and only when no explicit message was
/// stored. OS categories are resolved through the platform's own error
/// text; everything else gets [`UNKNOWN_ERROR_TEXT`].
pub(crate) fn describe_code(code: u32, kind: ErrorType) -> Cow<'static, str> {
    match kind {
        ErrorType::MachKernel => Cow::Owned(format!("mach kernel error 0x{code:08x}")),
        kind if kind == ErrorType::native_os() => Cow::Owned(os_error_text(code)),
        _ => Cow::Borrowed(UNKNOWN_ERROR_TEXT),
    }
}

/// The calling thread's raw OS error, `0` when there is none.
#[inline]
pub(crate) fn last_os_code() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Platform text for a raw OS error, without std's "(os error N)" suffix.
fn os_error_text(code: u32) -> String {
    // Win32 codes above i32::MAX wrap, matching how the OS itself reports them
    let raw = code as i32;
    let text = std::io::Error::from_raw_os_error(raw).to_string();
    let suffix = format!(" (os error {raw})");
    match text.strip_suffix(suffix.as_str()) {
        Some(stripped) if !stripped.is_empty() => stripped.to_owned(),
        _ => text,
    }
}
