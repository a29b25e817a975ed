//! Result codes surfaced by the tracer.
//!
//! Contract violations (missing handles, unknown names, uninitialized encoder)
//! are reported locally and never retried. Transport failures are passed
//! through untouched, so a `Timeout` or `Backend` value seen by a kernel hook
//! is exactly what the sink reported.

use core::fmt;

/// Errors returned by encoders, transports and the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceError {
    /// A required handle or argument was missing
    InvalidArg,
    /// Encoder not initialized, transport missing, or re-activation attempted
    InvalidState,
    /// No encoder or transport registered under the requested name
    NotFound,
    /// A fixed-capacity table is full
    NoMem,
    /// The sink has no room for the record
    NoSpace,
    /// The timeout policy expired before the sink accepted the data
    Timeout,
    /// The sink is in use and the caller asked not to wait
    Busy,
    /// Backend-specific failure code, reported verbatim
    Backend(i32),
}

impl TraceError {
    /// Integer result code as seen by C callers. Success is 0.
    pub const fn code(self) -> i32 {
        match self {
            TraceError::InvalidArg => 0x102,
            TraceError::InvalidState => 0x103,
            TraceError::NotFound => 0x105,
            TraceError::NoMem => 0x101,
            TraceError::NoSpace => 0x104,
            TraceError::Timeout => 0x107,
            TraceError::Busy => -1,
            TraceError::Backend(code) => code,
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::InvalidArg => write!(f, "invalid argument"),
            TraceError::InvalidState => write!(f, "invalid state"),
            TraceError::NotFound => write!(f, "not found"),
            TraceError::NoMem => write!(f, "table full"),
            TraceError::NoSpace => write!(f, "no space in sink"),
            TraceError::Timeout => write!(f, "operation timed out"),
            TraceError::Busy => write!(f, "sink busy"),
            TraceError::Backend(code) => write!(f, "backend error {:#x}", code),
        }
    }
}

/// Errors produced while decoding a captured byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ends in the middle of a record
    Truncated,
    /// The code byte does not name a known event
    UnknownCode(u8),
    /// A text field has no terminating NUL
    UnterminatedText,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "record truncated"),
            DecodeError::UnknownCode(code) => write!(f, "unknown event code {:#04x}", code),
            DecodeError::UnterminatedText => write!(f, "text field not terminated"),
        }
    }
}
