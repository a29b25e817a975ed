//! Decoder for captured trace streams.
//!
//! The stream has no framing, so decoding walks it record by record: read the
//! header, look the code up in the event table, then consume exactly the
//! fields its signature lists. A text field runs to its NUL terminator. One
//! unknown code or short record makes the rest of the stream unreadable,
//! which is why `RecordIter` stops at the first error.
//!
//! Records are printed one per line:
//!
//! ```text
//! [TRACE] CPU1 ts=1042 id=0x3c task_switched_in tcb=0x3ffb2000
//! [TRACE] CPU0 ts=1100 id=0x43 print_event msg="[boot] ok"
//! ```

use core::fmt;

use crate::error::DecodeError;
use crate::event::{EventCode, FieldKind};
use crate::record::{HEADER_SIZE, MAX_FIXED_FIELDS, PRINT_EVENT_CAPACITY};

/// One record parsed from a stream, borrowing its text from the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedRecord<'a> {
    pub timestamp: u32,
    pub code: EventCode,
    pub core_id: u8,
    values: [u32; MAX_FIXED_FIELDS],
    value_count: usize,
    text: Option<&'a [u8]>,
    len: usize,
}

impl<'a> DecodedRecord<'a> {
    /// Numeric field values in signature order.
    pub fn values(&self) -> &[u32] {
        &self.values[..self.value_count]
    }

    /// Value of the numeric field called `name`.
    pub fn field(&self, name: &str) -> Option<u32> {
        self.code
            .fields()
            .iter()
            .filter(|field| field.kind != FieldKind::Text)
            .zip(self.values())
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| *value)
    }

    /// Text payload without its terminator.
    pub fn text(&self) -> Option<&'a [u8]> {
        self.text
    }

    /// Bytes this record occupied in the stream.
    pub fn encoded_len(&self) -> usize {
        self.len
    }
}

impl fmt::Display for DecodedRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TRACE] CPU{} ts={} id={:#04x} {}",
            self.core_id,
            self.timestamp,
            self.code.as_u8(),
            self.code.name()
        )?;

        let mut values = self.values().iter();
        for field in self.code.fields() {
            match field.kind {
                FieldKind::Text => {
                    write!(f, " {}=\"", field.name)?;
                    for &byte in self.text.unwrap_or(&[]) {
                        match byte {
                            b'"' | b'\\' => write!(f, "\\{}", byte as char)?,
                            0x20..=0x7E => write!(f, "{}", byte as char)?,
                            _ => write!(f, "\\x{:02x}", byte)?,
                        }
                    }
                    write!(f, "\"")?;
                }
                FieldKind::U8 | FieldKind::U32 => {
                    if let Some(value) = values.next() {
                        write!(f, " {}={:#x}", field.name, value)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> Result<u32, DecodeError> {
    let raw = bytes.get(pos..pos + 4).ok_or(DecodeError::Truncated)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(raw);
    Ok(u32::from_ne_bytes(word))
}

/// Decode the record at the start of `bytes`.
///
/// Multi-byte fields are read in the host's byte order, so the stream must
/// come from a target with the same endianness.
pub fn decode_record(bytes: &[u8]) -> Result<DecodedRecord<'_>, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated);
    }
    let timestamp = read_u32(bytes, 0)?;
    let code = EventCode::from_u8(bytes[4]).ok_or(DecodeError::UnknownCode(bytes[4]))?;
    let core_id = bytes[5];

    let mut record = DecodedRecord {
        timestamp,
        code,
        core_id,
        values: [0; MAX_FIXED_FIELDS],
        value_count: 0,
        text: None,
        len: 0,
    };

    let mut pos = HEADER_SIZE;
    for field in code.fields() {
        let value = match field.kind {
            FieldKind::U8 => {
                let byte = *bytes.get(pos).ok_or(DecodeError::Truncated)?;
                pos += 1;
                byte as u32
            }
            FieldKind::U32 => {
                let value = read_u32(bytes, pos)?;
                pos += 4;
                value
            }
            FieldKind::Text => {
                let rest = &bytes[pos..];
                let window = &rest[..core::cmp::min(rest.len(), PRINT_EVENT_CAPACITY)];
                let nul = window
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(DecodeError::UnterminatedText)?;
                record.text = Some(&rest[..nul]);
                pos += nul + 1;
                continue;
            }
        };
        if let Some(slot) = record.values.get_mut(record.value_count) {
            *slot = value;
            record.value_count += 1;
        }
    }

    record.len = pos;
    Ok(record)
}

/// Iterator over the records of a captured stream.
///
/// Yields each record in order. After the first error it yields that error
/// once and then ends.
pub struct RecordIter<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> RecordIter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Offset of the next undecoded byte.
    pub fn offset(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<DecodedRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        match decode_record(&self.bytes[self.pos..]) {
            Ok(record) => {
                self.pos += record.encoded_len();
                Some(Ok(record))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
