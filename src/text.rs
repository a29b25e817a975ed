//! Bounded text buffer for formatted events.

use core::fmt;

/// A stack buffer of `N` bytes that accepts `core::fmt` output.
///
/// Holds at most `N - 1` content bytes, leaving room for the terminator the
/// wire format appends. Anything beyond that is dropped without error, so
/// formatting into it never fails and never overflows.
pub struct TextBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
    truncated: bool,
}

impl<const N: usize> TextBuf<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            truncated: false,
        }
    }

    /// Maximum number of content bytes.
    pub const fn capacity() -> usize {
        N.saturating_sub(1)
    }

    /// Content bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Content as text. A multi-byte character cut by truncation is omitted.
    pub fn as_str(&self) -> &str {
        match core::str::from_utf8(self.as_bytes()) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&self.buf[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether any output was dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<const N: usize> Default for TextBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for TextBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let remaining = Self::capacity() - self.len;
        let take = core::cmp::min(bytes.len(), remaining);
        if take < bytes.len() {
            self.truncated = true;
        }
        self.buf[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn formats_within_capacity() {
        let mut text = TextBuf::<32>::new();
        write!(text, "[{}] {}", "boot", 42).unwrap();
        assert_eq!(text.as_str(), "[boot] 42");
        assert!(!text.is_truncated());
    }

    #[test]
    fn truncates_silently() {
        let mut text = TextBuf::<8>::new();
        write!(text, "0123456789").unwrap();
        assert_eq!(text.as_bytes(), b"0123456");
        assert_eq!(text.len(), TextBuf::<8>::capacity());
        assert!(text.is_truncated());
        // Further writes are ignored, not errors
        write!(text, "more").unwrap();
        assert_eq!(text.len(), 7);
    }

    #[test]
    fn cut_character_is_dropped_from_str() {
        let mut text = TextBuf::<5>::new();
        // 'é' is two bytes; only one fits after "abc"
        write!(text, "abcé").unwrap();
        assert_eq!(text.as_bytes().len(), 4);
        assert_eq!(text.as_str(), "abc");
    }
}
