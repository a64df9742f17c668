//! C ABI surface for bindings in other languages.
//!
//! Handles are opaque heap pointers created with [`dbgapi_error_create`]
//! and released with [`dbgapi_error_destroy`]. Every function tolerates a
//! null handle: reads answer as an empty handle would, writes are no-ops.
//!
//! # String Lifetime
//!
//! [`dbgapi_error_get_cstring`] returns a NUL-terminated copy owned by the
//! handle. It stays valid until the next mutating call on the same handle
//! (or its destruction), mirroring the borrow `ErrorHandle::error_str`
//! enforces on the Rust side.
//!
//! # Formatting
//!
//! Formatted setters are Rust-only: C varargs cannot be consumed on
//! stable Rust. Format on the caller side and use
//! [`dbgapi_error_set_error_string`].

use crate::codes::{ErrorType, last_os_code};
use crate::handle::ErrorHandle;
use std::ffi::{CStr, CString, c_char};
use std::ptr;

/// Opaque handle exposed across the C boundary.
pub struct DbgApiError {
    handle: ErrorHandle,
    c_message: Option<CString>,
}

impl DbgApiError {
    fn new(handle: ErrorHandle) -> Self {
        Self {
            handle,
            c_message: None,
        }
    }

    /// Mutable access to the handle, dropping any cached C string.
    fn handle_mut(&mut self) -> &mut ErrorHandle {
        self.c_message = None;
        &mut self.handle
    }
}

/// Borrow the handle behind `ptr`, `None` for null.
///
/// # Safety
///
/// `ptr` must be null or come from this module and not yet be destroyed.
unsafe fn borrow_handle<'a>(ptr: *const DbgApiError) -> Option<&'a DbgApiError> {
    unsafe { ptr.as_ref() }
}

/// # Safety
///
/// As [`borrow_handle`], and no other reference to the handle may be live.
unsafe fn borrow_handle_mut<'a>(ptr: *mut DbgApiError) -> Option<&'a mut DbgApiError> {
    unsafe { ptr.as_mut() }
}

/// Allocate an empty handle.
#[unsafe(no_mangle)]
pub extern "C" fn dbgapi_error_create() -> *mut DbgApiError {
    Box::into_raw(Box::new(DbgApiError::new(ErrorHandle::new())))
}

/// Allocate a deep copy of `src` (empty if `src` is null or empty).
///
/// # Safety
///
/// `src` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_clone(src: *const DbgApiError) -> *mut DbgApiError {
    let handle = unsafe { borrow_handle(src) }.map_or_else(ErrorHandle::new, |src| src.handle.clone());
    Box::into_raw(Box::new(DbgApiError::new(handle)))
}

/// Assign `src` into `dst` with copy semantics.
///
/// A null or empty `src` empties `dst`.
///
/// # Safety
///
/// Both pointers must be null or live handles from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_assign(dst: *mut DbgApiError, src: *const DbgApiError) {
    if ptr::eq(dst, src) {
        return;
    }
    let Some(dst) = (unsafe { borrow_handle_mut(dst) }) else {
        return;
    };
    match unsafe { borrow_handle(src) } {
        Some(src) => dst.handle_mut().clone_from(&src.handle),
        None => dst.handle_mut().reset(),
    }
}

/// Release a handle. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module; it must not be
/// used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_destroy(ptr: *mut DbgApiError) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(ptr) });
    }
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_is_valid(ptr: *const DbgApiError) -> bool {
    unsafe { borrow_handle(ptr) }.is_some_and(|e| e.handle.is_valid())
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_success(ptr: *const DbgApiError) -> bool {
    unsafe { borrow_handle(ptr) }.is_none_or(|e| e.handle.success())
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_fail(ptr: *const DbgApiError) -> bool {
    unsafe { borrow_handle(ptr) }.is_some_and(|e| e.handle.fail())
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_get_error(ptr: *const DbgApiError) -> u32 {
    unsafe { borrow_handle(ptr) }.map_or(0, |e| e.handle.error_code())
}

/// Raw [`ErrorType`] discriminant.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_get_type(ptr: *const DbgApiError) -> u32 {
    unsafe { borrow_handle(ptr) }.map_or(ErrorType::Invalid.as_raw(), |e| e.handle.error_type().as_raw())
}

/// Failure text, or null when empty or successful.
///
/// Text containing interior NUL bytes is cut at the first one.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module. The result is
/// invalidated by the next mutating call on the same handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_get_cstring(ptr: *mut DbgApiError) -> *const c_char {
    let Some(err) = (unsafe { borrow_handle_mut(ptr) }) else {
        return ptr::null();
    };
    let Some(text) = err.handle.error_str() else {
        err.c_message = None;
        return ptr::null();
    };
    if err.c_message.is_none() {
        let visible = text.split('\0').next().unwrap_or("");
        err.c_message = CString::new(visible).ok();
    }
    err.c_message.as_deref().map_or(ptr::null(), CStr::as_ptr)
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_clear(ptr: *mut DbgApiError) {
    if let Some(err) = unsafe { borrow_handle_mut(ptr) } {
        err.handle_mut().clear();
    }
}

/// Set code and raw category. Unknown categories become `Invalid`.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_set_error(ptr: *mut DbgApiError, code: u32, kind: u32) {
    if let Some(err) = unsafe { borrow_handle_mut(ptr) } {
        err.handle_mut().set_error(code, ErrorType::from_raw(kind));
    }
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_set_error_to_errno(ptr: *mut DbgApiError) {
    let raw = last_os_code();
    if let Some(err) = unsafe { borrow_handle_mut(ptr) } {
        err.handle_mut().set_error_to_os_code(raw);
    }
}

/// # Safety
///
/// `ptr` must be null or a live handle from this module.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_set_error_to_generic_error(ptr: *mut DbgApiError) {
    if let Some(err) = unsafe { borrow_handle_mut(ptr) } {
        err.handle_mut().set_error_to_generic_error();
    }
}

/// Store a message. A null `text` behaves like an empty string; invalid
/// UTF-8 is replaced lossily.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module; `text` must be
/// null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_set_error_string(ptr: *mut DbgApiError, text: *const c_char) {
    let Some(err) = (unsafe { borrow_handle_mut(ptr) }) else {
        return;
    };
    if text.is_null() {
        err.handle_mut().set_error_string("");
        return;
    }
    let text = unsafe { CStr::from_ptr(text) }.to_string_lossy();
    err.handle_mut().set_error_string(&text);
}

/// Write the description into `buf`, `snprintf` style.
///
/// Writes at most `len - 1` bytes plus a NUL terminator and returns the
/// full description length. A null `buf` or zero `len` only measures.
///
/// # Safety
///
/// `ptr` must be null or a live handle from this module; `buf` must be
/// null or point to at least `len` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dbgapi_error_get_description(
    ptr: *const DbgApiError,
    buf: *mut c_char,
    len: usize,
) -> usize {
    let mut description = String::new();
    match unsafe { borrow_handle(ptr) } {
        Some(err) => err.handle.get_description(&mut description),
        None => ErrorHandle::new().get_description(&mut description),
    };

    if !buf.is_null() && len > 0 {
        let copied = description.len().min(len - 1);
        unsafe {
            ptr::copy_nonoverlapping(description.as_ptr().cast::<c_char>(), buf, copied);
            *buf.add(copied) = 0;
        }
    }
    description.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cstring_of(ptr: *mut DbgApiError) -> Option<String> {
        let raw = unsafe { dbgapi_error_get_cstring(ptr) };
        if raw.is_null() {
            None
        } else {
            Some(unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned())
        }
    }

    fn description_of(ptr: *const DbgApiError) -> String {
        let mut buf = [0 as c_char; 64];
        let full = unsafe { dbgapi_error_get_description(ptr, buf.as_mut_ptr(), buf.len()) };
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_string_lossy().into_owned();
        assert_eq!(full, text.len());
        text
    }

    #[test]
    fn create_query_destroy() {
        let err = dbgapi_error_create();
        unsafe {
            assert!(!dbgapi_error_is_valid(err));
            assert!(dbgapi_error_success(err));
            assert!(!dbgapi_error_fail(err));
            assert_eq!(dbgapi_error_get_error(err), 0);
            assert_eq!(dbgapi_error_get_type(err), 0);
        }
        assert_eq!(cstring_of(err), None);
        assert_eq!(description_of(err), "error: <no state>");
        unsafe { dbgapi_error_destroy(err) };
    }

    #[test]
    fn null_handles_are_tolerated() {
        let null = ptr::null_mut::<DbgApiError>();
        unsafe {
            assert!(!dbgapi_error_is_valid(null));
            assert!(dbgapi_error_success(null));
            assert!(!dbgapi_error_fail(null));
            assert_eq!(dbgapi_error_get_error(null), 0);
            dbgapi_error_clear(null);
            dbgapi_error_set_error(null, 1, 1);
            dbgapi_error_set_error_string(null, c"x".as_ptr());
            dbgapi_error_destroy(null);
        }
        assert_eq!(cstring_of(null), None);
        assert_eq!(description_of(null), "error: <no state>");
    }

    #[test]
    fn set_and_read_message() {
        let err = dbgapi_error_create();
        unsafe { dbgapi_error_set_error_string(err, c"disk full".as_ptr()) };
        assert_eq!(cstring_of(err).as_deref(), Some("disk full"));
        assert_eq!(description_of(err), "error: disk full");
        unsafe {
            assert!(dbgapi_error_fail(err));
            dbgapi_error_clear(err);
            assert!(dbgapi_error_is_valid(err));
            assert!(dbgapi_error_success(err));
        }
        assert_eq!(cstring_of(err), None);
        assert_eq!(description_of(err), "success");
        unsafe { dbgapi_error_destroy(err) };
    }

    #[test]
    fn cached_cstring_is_refreshed_after_mutation() {
        let err = dbgapi_error_create();
        unsafe { dbgapi_error_set_error_string(err, c"first".as_ptr()) };
        assert_eq!(cstring_of(err).as_deref(), Some("first"));
        unsafe { dbgapi_error_set_error_string(err, c"second".as_ptr()) };
        assert_eq!(cstring_of(err).as_deref(), Some("second"));
        unsafe { dbgapi_error_destroy(err) };
    }

    #[test]
    fn clone_and_assign_are_deep() {
        let a = dbgapi_error_create();
        unsafe { dbgapi_error_set_error(a, 2, ErrorType::Posix.as_raw()) };

        let b = unsafe { dbgapi_error_clone(a) };
        unsafe {
            dbgapi_error_set_error(a, 5, ErrorType::Posix.as_raw());
            assert_eq!(dbgapi_error_get_error(b), 2);
            assert_eq!(dbgapi_error_get_type(b), ErrorType::Posix.as_raw());
        }

        let empty = dbgapi_error_create();
        unsafe {
            dbgapi_error_assign(b, empty);
            assert!(!dbgapi_error_is_valid(b));

            dbgapi_error_assign(b, a);
            assert_eq!(dbgapi_error_get_error(b), 5);

            dbgapi_error_assign(b, b);
            assert_eq!(dbgapi_error_get_error(b), 5);

            dbgapi_error_destroy(a);
            dbgapi_error_destroy(b);
            dbgapi_error_destroy(empty);
        }
    }

    #[test]
    fn unknown_raw_type_becomes_invalid() {
        let err = dbgapi_error_create();
        unsafe {
            dbgapi_error_set_error(err, 3, 99);
            assert_eq!(dbgapi_error_get_type(err), ErrorType::Invalid.as_raw());
            assert!(dbgapi_error_fail(err));
            dbgapi_error_destroy(err);
        }
    }

    #[test]
    fn generic_error_and_errno_are_distinct() {
        let err = dbgapi_error_create();
        unsafe {
            dbgapi_error_set_error_to_generic_error(err);
            assert_eq!(dbgapi_error_get_error(err), crate::GENERIC_ERROR);
            assert_eq!(dbgapi_error_get_type(err), ErrorType::Generic.as_raw());

            dbgapi_error_set_error_to_errno(err);
            assert_ne!(dbgapi_error_get_type(err), ErrorType::Generic.as_raw());
            dbgapi_error_destroy(err);
        }
    }

    #[cfg(unix)]
    #[test]
    fn errno_survives_a_sink_that_makes_syscalls() {
        use crate::logging::{LogCategory, LogSink, clear_log_sink, install_log_sink};
        use std::sync::Arc;

        struct SyscallSink;

        impl LogSink for SyscallSink {
            fn is_enabled(&self, _category: LogCategory) -> bool {
                true
            }

            fn emit(&self, _category: LogCategory, _line: &str) {
                let _ = std::fs::OpenOptions::new().append(true).open("/");
            }
        }

        let err = dbgapi_error_create();
        install_log_sink(Arc::new(SyscallSink));
        let _ = std::fs::File::open("/definitely/not/a/real/path/for/dbgapi");
        unsafe { dbgapi_error_set_error_to_errno(err) };
        clear_log_sink();

        unsafe {
            assert_eq!(dbgapi_error_get_error(err), 2);
            assert_eq!(dbgapi_error_get_type(err), ErrorType::Posix.as_raw());
            dbgapi_error_destroy(err);
        }
    }

    #[test]
    fn description_truncates_to_buffer() {
        let err = dbgapi_error_create();
        unsafe { dbgapi_error_set_error_string(err, c"0123456789".as_ptr()) };

        let mut buf = [0x7f as c_char; 8];
        let full = unsafe { dbgapi_error_get_description(err, buf.as_mut_ptr(), buf.len()) };
        assert_eq!(full, "error: 0123456789".len());
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, "error: ");

        let measured = unsafe { dbgapi_error_get_description(err, ptr::null_mut(), 0) };
        assert_eq!(measured, full);
        unsafe { dbgapi_error_destroy(err) };
    }

    #[test]
    fn null_text_clears_message() {
        let err = dbgapi_error_create();
        unsafe {
            dbgapi_error_set_error_string(err, ptr::null());
            assert!(dbgapi_error_is_valid(err));
            assert!(dbgapi_error_success(err));
            dbgapi_error_destroy(err);
        }
    }
}
