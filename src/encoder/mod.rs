//! Encoder abstraction.
//!
//! An encoder turns tracepoints into bytes for its bound transport. Each
//! implementation provides three operations through `EncoderOps`:
//!
//! - `init`: validate the bound transport and make the encoder live
//! - `write`: forward raw bytes to the transport, unchanged
//! - `print_event`: emit a free-form `"[name] text"` message
//!
//! `TraceEncoder` is the handle an encoder is bound to: its name, its
//! operations and the transport it writes to. Handles are `'static` and never
//! destroyed; the active one is chosen once at startup through the registry.

pub mod ctf;

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TraceError;
use crate::transport::{Timeout, Transport};

/// Maximum number of cores tracked by per-core statistics.
pub const MAX_CORES: usize = 2;

/// Options passed to `EncoderOps::init`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Policy used for every record write.
    pub timeout: Timeout,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            timeout: Timeout::INFINITE,
        }
    }
}

/// Operations every encoder implements.
///
/// A missing handle or argument is modelled as `None` and rejected with
/// `InvalidArg`, which is what C callers passing NULL observe.
pub trait EncoderOps: Sync {
    /// Bind `enc` as this encoder's live handle.
    ///
    /// Fails with `InvalidState` if `enc` has no transport or the transport
    /// cannot take writes. Must run once before any event is traced.
    fn init(&self, enc: &'static TraceEncoder, cfg: Option<&EncoderConfig>)
        -> Result<(), TraceError>;

    /// Forward `data` to the transport of `enc` and return its result.
    fn write(&self, enc: Option<&TraceEncoder>, data: &[u8], timeout: Timeout)
        -> Result<(), TraceError>;

    /// Emit `"[event_name] text"` as a text event, truncated to capacity.
    fn print_event(
        &self,
        enc: Option<&TraceEncoder>,
        event_name: Option<&str>,
        text: Option<&str>,
    ) -> Result<(), TraceError>;
}

/// A named encoder bound to one transport.
pub struct TraceEncoder {
    name: &'static str,
    ops: &'static dyn EncoderOps,
    transport: Option<&'static dyn Transport>,
}

impl TraceEncoder {
    pub const fn new(
        name: &'static str,
        ops: &'static dyn EncoderOps,
        transport: Option<&'static dyn Transport>,
    ) -> Self {
        Self {
            name,
            ops,
            transport,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ops(&self) -> &'static dyn EncoderOps {
        self.ops
    }

    /// The transport this handle writes to, if bound.
    pub fn transport(&self) -> Option<&'static dyn Transport> {
        self.transport
    }

    /// Run the encoder's `init` on this handle.
    pub fn init(&'static self, cfg: Option<&EncoderConfig>) -> Result<(), TraceError> {
        self.ops.init(self, cfg)
    }

    /// Write raw bytes through this handle.
    pub fn write(&self, data: &[u8], timeout: Timeout) -> Result<(), TraceError> {
        self.ops.write(Some(self), data, timeout)
    }

    /// Emit a text event through this handle.
    pub fn print_event(&self, event_name: &str, text: &str) -> Result<(), TraceError> {
        self.ops.print_event(Some(self), Some(event_name), Some(text))
    }
}

/// A per-core counter slot on its own cache line.
#[repr(C, align(64))]
struct CoreSlot {
    records: AtomicUsize,
}

impl CoreSlot {
    const fn new() -> Self {
        Self {
            records: AtomicUsize::new(0),
        }
    }
}

/// Lock-free write statistics for one encoder.
///
/// Counters use relaxed ordering and are approximate while tracing runs.
pub struct EncoderStats {
    per_core: [CoreSlot; MAX_CORES],
    bytes: AtomicUsize,
    failures: AtomicUsize,
}

/// Plain copy of `EncoderStats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub records_per_core: [usize; MAX_CORES],
    pub bytes: usize,
    pub failures: usize,
}

impl StatsSnapshot {
    /// Records written across all tracked cores.
    pub fn records(&self) -> usize {
        self.records_per_core.iter().sum()
    }
}

impl EncoderStats {
    pub const fn new() -> Self {
        const SLOT: CoreSlot = CoreSlot::new();
        Self {
            per_core: [SLOT; MAX_CORES],
            bytes: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Account for one write attempt of `len` bytes from `core_id`.
    #[inline(always)]
    pub(crate) fn record(&self, core_id: u8, len: usize, result: &Result<(), TraceError>) {
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.bytes.fetch_add(len, Ordering::Relaxed);
        if let Some(slot) = self.per_core.get(core_id as usize) {
            slot.records.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let mut records_per_core = [0; MAX_CORES];
        for (out, slot) in records_per_core.iter_mut().zip(self.per_core.iter()) {
            *out = slot.records.load(Ordering::Relaxed);
        }
        StatsSnapshot {
            records_per_core,
            bytes: self.bytes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for EncoderStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_accumulate_per_core() {
        let stats = EncoderStats::new();
        stats.record(0, 10, &Ok(()));
        stats.record(1, 14, &Ok(()));
        stats.record(1, 6, &Ok(()));
        stats.record(0, 10, &Err(TraceError::Timeout));
        // Cores beyond MAX_CORES are not counted per core
        stats.record(7, 10, &Ok(()));

        let snap = stats.snapshot();
        assert_eq!(snap.records_per_core, [1, 2]);
        assert_eq!(snap.records(), 3);
        assert_eq!(snap.bytes, 40);
        assert_eq!(snap.failures, 1);
    }

    #[test]
    fn default_config_blocks() {
        assert_eq!(EncoderConfig::default().timeout, Timeout::INFINITE);
    }
}
