//! Transport abstraction.
//!
//! A transport is the byte sink behind the active encoder: a UART, a debug
//! JTAG channel, a shared-memory ring. The tracer sees a single operation,
//! `write`, and hands it complete records together with the caller's timeout
//! policy. Queuing, buffering and reentrancy protection are the transport's
//! business; the tracer adds none.
//!
//! Transports may be called from interrupt context. An ISR caller is expected
//! to configure `Timeout::NO_WAIT`.

pub mod ring;

use crate::error::TraceError;

/// How long a transport may wait for the sink to accept data, in microseconds.
///
/// The tracer never interprets the value; it is passed to `Transport::write`
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timeout(u32);

impl Timeout {
    /// Fail immediately if the sink cannot take the data.
    pub const NO_WAIT: Timeout = Timeout(0);

    /// Wait as long as it takes.
    pub const INFINITE: Timeout = Timeout(u32::MAX);

    /// Bounded wait.
    pub const fn from_micros(micros: u32) -> Self {
        Timeout(micros)
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    pub const fn is_no_wait(self) -> bool {
        self.0 == 0
    }

    pub const fn is_infinite(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::INFINITE
    }
}

/// A byte sink accepting whole trace records.
pub trait Transport: Sync {
    /// Write all of `data`, honoring `timeout`. Must either accept the whole
    /// slice or fail; a partial write would desynchronize the decoder.
    fn write(&self, data: &[u8], timeout: Timeout) -> Result<(), TraceError>;

    /// Whether the sink is open and able to take writes.
    fn is_ready(&self) -> bool {
        true
    }
}
