//! Test doubles shared by the unit tests.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};

use spin::Mutex;
use std::boxed::Box;
use std::vec::Vec;

use crate::error::TraceError;
use crate::timestamp::CycleClock;
use crate::transport::{Timeout, Transport};

/// Give a test value the `'static` lifetime the tracer types require.
pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Transport that records every accepted write.
pub struct FakeTransport {
    writes: Mutex<Vec<(Vec<u8>, Timeout)>>,
    calls: AtomicUsize,
    fail_with: Mutex<Option<TraceError>>,
    ready: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            ready: AtomicBool::new(true),
        }
    }

    /// A transport whose `is_ready` reports false.
    pub fn not_ready() -> Self {
        let transport = Self::new();
        transport.ready.store(false, Ordering::Relaxed);
        transport
    }

    /// Fail every following write with `err`.
    pub fn fail_with(&self, err: TraceError) {
        *self.fail_with.lock() = Some(err);
    }

    /// Payloads of accepted writes, oldest first.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().iter().map(|(data, _)| data.clone()).collect()
    }

    pub fn last_timeout(&self) -> Option<Timeout> {
        self.writes.lock().last().map(|(_, timeout)| *timeout)
    }

    /// Write attempts, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Transport for FakeTransport {
    fn write(&self, data: &[u8], timeout: Timeout) -> Result<(), TraceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = *self.fail_with.lock() {
            return Err(err);
        }
        self.writes.lock().push((data.to_vec(), timeout));
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}

/// Clock returning whatever the test sets.
pub struct FixedClock {
    cycles: AtomicU32,
    core: AtomicU8,
}

impl FixedClock {
    pub fn new(cycles: u32, core: u8) -> Self {
        Self {
            cycles: AtomicU32::new(cycles),
            core: AtomicU8::new(core),
        }
    }

    pub fn set_cycles(&self, cycles: u32) {
        self.cycles.store(cycles, Ordering::Relaxed);
    }

    pub fn set_core(&self, core: u8) {
        self.core.store(core, Ordering::Relaxed);
    }
}

impl CycleClock for FixedClock {
    fn cycle_count(&self) -> u32 {
        self.cycles.load(Ordering::Relaxed)
    }

    fn core_id(&self) -> u8 {
        self.core.load(Ordering::Relaxed)
    }
}
