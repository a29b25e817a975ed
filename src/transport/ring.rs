//! In-memory ring transport.
//!
//! A fixed-capacity byte FIFO that stands in for a shared-memory trace
//! channel: producers append whole records, a consumer (host adapter, dump task,
//! test) drains bytes in order.
//!
//! # Design
//!
//! - Capacity is a const parameter; storage lives inline, no allocation
//! - Records are never split: one that does not fit is rejected whole and
//!   counted as dropped (`NoSpace`)
//! - Waits only for the lock, never for space. `Timeout::NO_WAIT` makes one
//!   `try_lock` and fails with `Busy`; a bounded timeout retries `try_lock`
//!   `SPINS_PER_MICRO` times per microsecond and then fails with `Timeout`;
//!   `Timeout::INFINITE` spins on the lock
//!
//! The ring has no clock, so a bounded wait is counted in lock attempts and
//! its real duration is approximate. An interrupt that fires while its own
//! core holds the lock must not use `INFINITE`, otherwise it spins forever.

use core::sync::atomic::{AtomicUsize, Ordering};

use spin::{Mutex, MutexGuard};

use super::{Timeout, Transport};
use crate::error::TraceError;

/// Lock attempts per microsecond of a bounded timeout.
pub const SPINS_PER_MICRO: u32 = 32;

struct Ring<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest byte.
    head: usize,
    /// Bytes currently stored.
    len: usize,
}

impl<const N: usize> Ring<N> {
    const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
        }
    }

    fn free(&self) -> usize {
        N - self.len
    }

    fn push(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let tail = (self.head + self.len) % N;
        let first = core::cmp::min(data.len(), N - tail);
        self.buf[tail..tail + first].copy_from_slice(&data[..first]);
        self.buf[..data.len() - first].copy_from_slice(&data[first..]);
        self.len += data.len();
    }

    fn pop(&mut self, out: &mut [u8]) -> usize {
        let count = core::cmp::min(out.len(), self.len);
        if count == 0 {
            return 0;
        }
        let first = core::cmp::min(count, N - self.head);
        out[..first].copy_from_slice(&self.buf[self.head..self.head + first]);
        out[first..count].copy_from_slice(&self.buf[..count - first]);
        self.head = (self.head + count) % N;
        self.len -= count;
        count
    }
}

/// Ring-buffer transport holding up to `N` bytes.
pub struct RingTransport<const N: usize> {
    ring: Mutex<Ring<N>>,
    /// Records rejected for lack of space.
    dropped: AtomicUsize,
    /// Records accepted since creation.
    written: AtomicUsize,
}

impl<const N: usize> RingTransport<N> {
    /// Create an empty ring (const for static placement).
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(Ring::new()),
            dropped: AtomicUsize::new(0),
            written: AtomicUsize::new(0),
        }
    }

    /// Move up to `out.len()` of the oldest bytes into `out`.
    ///
    /// Returns the number of bytes copied.
    pub fn drain(&self, out: &mut [u8]) -> usize {
        self.ring.lock().pop(out)
    }

    /// Bytes waiting to be drained.
    pub fn len(&self) -> usize {
        self.ring.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Records rejected because the ring was full.
    pub fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Records accepted.
    pub fn written_count(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }
}

impl<const N: usize> RingTransport<N> {
    fn lock_within(&self, timeout: Timeout) -> Result<MutexGuard<'_, Ring<N>>, TraceError> {
        let budget = timeout.as_micros().saturating_mul(SPINS_PER_MICRO);
        for _ in 0..budget {
            if let Some(guard) = self.ring.try_lock() {
                return Ok(guard);
            }
            core::hint::spin_loop();
        }
        // Last attempt so a zero budget still gets one try
        self.ring.try_lock().ok_or(TraceError::Timeout)
    }
}

impl<const N: usize> Default for RingTransport<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Transport for RingTransport<N> {
    fn write(&self, data: &[u8], timeout: Timeout) -> Result<(), TraceError> {
        let mut ring = if timeout.is_no_wait() {
            self.ring.try_lock().ok_or(TraceError::Busy)?
        } else if timeout.is_infinite() {
            self.ring.lock()
        } else {
            self.lock_within(timeout)?
        };

        if data.len() > ring.free() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(TraceError::NoSpace);
        }

        ring.push(data);
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        N > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order() {
        let ring = RingTransport::<16>::new();
        ring.write(b"abc", Timeout::INFINITE).unwrap();
        ring.write(b"defg", Timeout::NO_WAIT).unwrap();
        assert_eq!(ring.len(), 7);
        assert_eq!(ring.written_count(), 2);

        let mut out = [0u8; 16];
        let n = ring.drain(&mut out);
        assert_eq!(&out[..n], b"abcdefg");
        assert!(ring.is_empty());
    }

    #[test]
    fn wraps_around() {
        let ring = RingTransport::<8>::new();
        let mut out = [0u8; 8];
        ring.write(b"123456", Timeout::INFINITE).unwrap();
        assert_eq!(ring.drain(&mut out[..4]), 4);
        ring.write(b"7890ab", Timeout::INFINITE).unwrap();
        let n = ring.drain(&mut out);
        assert_eq!(&out[..n], b"567890ab");
    }

    #[test]
    fn full_ring_rejects_whole_record() {
        let ring = RingTransport::<8>::new();
        ring.write(b"12345", Timeout::INFINITE).unwrap();
        assert_eq!(ring.write(b"6789", Timeout::INFINITE), Err(TraceError::NoSpace));
        assert_eq!(ring.dropped_count(), 1);
        assert_eq!(ring.len(), 5);
        // A record that fits still goes in
        ring.write(b"678", Timeout::INFINITE).unwrap();
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn no_wait_reports_busy_when_locked() {
        let ring = RingTransport::<8>::new();
        let _held = ring.ring.lock();
        assert_eq!(ring.write(b"x", Timeout::NO_WAIT), Err(TraceError::Busy));
    }

    #[test]
    fn bounded_wait_times_out_when_locked() {
        let ring = RingTransport::<8>::new();
        let held = ring.ring.lock();
        assert_eq!(
            ring.write(b"x", Timeout::from_micros(2)),
            Err(TraceError::Timeout)
        );
        drop(held);
        ring.write(b"x", Timeout::from_micros(2)).unwrap();
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn zero_capacity_is_not_ready() {
        let ring = RingTransport::<0>::new();
        assert!(!ring.is_ready());
    }
}
