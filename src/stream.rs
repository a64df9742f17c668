//! Append-only text sink for rendered descriptions.
//!
//! [`ErrorHandle::get_description`](crate::ErrorHandle::get_description)
//! writes into anything implementing [`fmt::Write`]. `Stream` is the
//! crate's own such sink: a growable buffer that can only be appended to
//! or emptied as a whole.

use std::fmt;
use zeroize::Zeroize;

/// Growable, append-only text buffer.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Stream {
    data: String,
}

impl Stream {
    /// An empty stream.
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: String::new(),
        }
    }

    /// Append `text` verbatim.
    #[inline]
    pub fn append(&mut self, text: &str) {
        self.data.push_str(text);
    }

    /// Append formatted text. Formatting failures leave whatever was
    /// written before the failure in place.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        let _ = fmt::Write::write_fmt(self, args);
    }

    /// Everything appended so far.
    #[inline]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Discard the contents, zeroizing the buffer.
    pub fn clear(&mut self) {
        self.data.zeroize();
    }
}

impl fmt::Write for Stream {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s);
        Ok(())
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").field("len", &self.data.len()).finish()
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}
