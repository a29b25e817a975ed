//! Field-packing engine.
//!
//! A record is a header followed by the event's fields, tightly packed in
//! declaration order with no padding, alignment or length prefix:
//!
//! ```text
//! +-----------+------+---------+---------+-----+---------+
//! | timestamp | code | core_id | field_0 | ... | field_n |
//! | (4 bytes) | (1)  | (1)     |         |     |         |
//! +-----------+------+---------+---------+-----+---------+
//! ```
//!
//! Multi-byte values use the CPU's native byte order. Records are assembled in
//! a stack buffer whose size is a const parameter, so packing never allocates
//! and never fails; the only failure point is the transport write that
//! follows.

use crate::event::EventCode;

/// Size of the record header: timestamp, code, core id.
pub const HEADER_SIZE: usize = 6;

/// Largest number of 32-bit fields carried by any fixed event.
pub const MAX_FIXED_FIELDS: usize = 5;

/// Largest fixed-size record.
pub const MAX_FIXED_RECORD_SIZE: usize = HEADER_SIZE + 4 * MAX_FIXED_FIELDS;

/// Capacity of a print-event text field, terminator included.
pub const PRINT_EVENT_CAPACITY: usize = 256;

/// Largest print-event record.
pub const MAX_TEXT_RECORD_SIZE: usize = HEADER_SIZE + PRINT_EVENT_CAPACITY;

/// A record under construction in a fixed stack buffer of `N` bytes.
pub struct RecordBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> RecordBuf<N> {
    /// Start a record with its header.
    #[inline(always)]
    pub fn new(timestamp: u32, code: EventCode, core_id: u8) -> Self {
        let mut record = Self {
            buf: [0; N],
            len: 0,
        };
        record.push_u32(timestamp);
        record.push_u8(code.as_u8());
        record.push_u8(core_id);
        record
    }

    /// Append an 8-bit field.
    #[inline(always)]
    pub fn push_u8(&mut self, value: u8) {
        self.push_bytes(&[value]);
    }

    /// Append a 32-bit field in native byte order.
    #[inline(always)]
    pub fn push_u32(&mut self, value: u32) {
        self.push_bytes(&value.to_ne_bytes());
    }

    /// Append a text field: at most `PRINT_EVENT_CAPACITY - 1` content bytes
    /// followed by a NUL terminator. Content past the first NUL or past the
    /// capacity is dropped silently.
    ///
    /// Returns the number of content bytes kept.
    pub fn push_text(&mut self, text: &[u8]) -> usize {
        let limit = core::cmp::min(PRINT_EVENT_CAPACITY - 1, N.saturating_sub(self.len + 1));
        let content = match text.iter().position(|&b| b == 0) {
            Some(nul) => &text[..nul],
            None => text,
        };
        let kept = core::cmp::min(content.len(), limit);
        self.push_bytes(&content[..kept]);
        self.push_u8(0);
        kept
    }

    #[inline(always)]
    fn push_bytes(&mut self, bytes: &[u8]) {
        let end = self.len + bytes.len();
        debug_assert!(end <= N, "record overflows its {}-byte buffer", N);
        if let Some(slot) = self.buf.get_mut(self.len..end) {
            slot.copy_from_slice(bytes);
            self.len = end;
        }
    }

    /// Packed bytes written so far.
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Pack a fixed event: header followed by `fields` in order.
#[inline(always)]
pub fn pack(
    timestamp: u32,
    code: EventCode,
    core_id: u8,
    fields: &[u32],
) -> RecordBuf<MAX_FIXED_RECORD_SIZE> {
    debug_assert_eq!(Some(HEADER_SIZE + 4 * fields.len()), code.record_size());
    let mut record = RecordBuf::new(timestamp, code, core_id);
    for &value in fields {
        record.push_u32(value);
    }
    record
}

/// Pack a text event: header followed by one NUL-terminated text field.
#[inline]
pub fn pack_text(
    timestamp: u32,
    code: EventCode,
    core_id: u8,
    text: &[u8],
) -> RecordBuf<MAX_TEXT_RECORD_SIZE> {
    debug_assert!(code.has_text());
    let mut record = RecordBuf::new(timestamp, code, core_id);
    record.push_text(text);
    record
}
