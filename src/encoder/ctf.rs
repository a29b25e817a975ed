//! The "ctf" encoder.
//!
//! Packs every kernel event into a CTF-style binary record and hands it to
//! the bound transport. The encoder holds no per-event state: after `init` it
//! only remembers the handle it was bound to and the write timeout.
//!
//! One inherent method per fixed event is generated from the event table, so
//! the entry point signatures always match the wire signatures:
//!
//! ```rust,ignore
//! CTF_ENCODER.task_switched_in(tcb)?;
//! CTF_ENCODER.queue_create(queue_length, item_size, queue_type)?;
//! ```

use core::fmt::Write;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU32, Ordering};

use super::{EncoderConfig, EncoderOps, EncoderStats, StatsSnapshot, TraceEncoder};
use crate::error::TraceError;
use crate::event::EventCode;
use crate::macros::for_each_ctf_event;
use crate::record::{self, PRINT_EVENT_CAPACITY};
use crate::registry::EncoderEntry;
use crate::text::TextBuf;
use crate::timestamp::{CpuClock, CycleClock};
use crate::transport::Timeout;

/// Name the encoder registers under.
pub const CTF_ENCODER_NAME: &str = "ctf";

// =============================================================================
// Global Instance
// =============================================================================

/// The process-wide ctf encoder, sampling the hardware cycle counter.
pub static CTF_ENCODER: CtfEncoder = CtfEncoder::new(&CpuClock);

/// Registry entry for `CTF_ENCODER`.
pub static CTF_ENTRY: EncoderEntry = EncoderEntry::new(CTF_ENCODER_NAME, &CTF_ENCODER);

// =============================================================================
// Encoder
// =============================================================================

/// CTF record encoder.
pub struct CtfEncoder {
    /// Handle bound by `init`; null until then.
    enc: AtomicPtr<TraceEncoder>,
    /// Write timeout in microseconds, see `Timeout`.
    timeout: AtomicU32,
    clock: &'static dyn CycleClock,
    stats: EncoderStats,
}

impl CtfEncoder {
    pub const fn new(clock: &'static dyn CycleClock) -> Self {
        Self {
            enc: AtomicPtr::new(ptr::null_mut()),
            timeout: AtomicU32::new(Timeout::INFINITE.as_micros()),
            clock,
            stats: EncoderStats::new(),
        }
    }

    /// Handle bound by the last successful `init`.
    #[inline(always)]
    pub fn bound(&self) -> Option<&'static TraceEncoder> {
        let enc = self.enc.load(Ordering::Acquire);
        // SAFETY: only `init` stores into `enc`, and it stores `&'static`
        // references, so a non-null pointer is valid for the program lifetime.
        unsafe { enc.as_ref() }
    }

    pub fn is_initialized(&self) -> bool {
        self.bound().is_some()
    }

    /// Timeout applied to every record write.
    pub fn timeout(&self) -> Timeout {
        Timeout::from_micros(self.timeout.load(Ordering::Relaxed))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Emit a text event through the bound handle.
    ///
    /// `text` is stored up to its first NUL and at most
    /// `PRINT_EVENT_CAPACITY - 1` bytes.
    pub fn emit_text(&self, code: EventCode, text: &[u8]) -> Result<(), TraceError> {
        let enc = self.bound().ok_or(TraceError::InvalidState)?;
        self.emit_text_to(enc, code, text)
    }

    /// Pack a fixed event and write it through the bound handle.
    #[inline(always)]
    fn emit(&self, code: EventCode, fields: &[u32]) -> Result<(), TraceError> {
        let enc = self.bound().ok_or(TraceError::InvalidState)?;
        let timestamp = self.clock.cycle_count();
        let core_id = self.clock.core_id();
        let record = record::pack(timestamp, code, core_id, fields);
        self.submit(enc, core_id, record.as_bytes())
    }

    fn emit_text_to(
        &self,
        enc: &TraceEncoder,
        code: EventCode,
        text: &[u8],
    ) -> Result<(), TraceError> {
        let timestamp = self.clock.cycle_count();
        let core_id = self.clock.core_id();
        let record = record::pack_text(timestamp, code, core_id, text);
        self.submit(enc, core_id, record.as_bytes())
    }

    #[inline(always)]
    fn submit(&self, enc: &TraceEncoder, core_id: u8, bytes: &[u8]) -> Result<(), TraceError> {
        let result = EncoderOps::write(self, Some(enc), bytes, self.timeout());
        self.stats.record(core_id, bytes.len(), &result);
        result
    }
}

impl EncoderOps for CtfEncoder {
    fn init(
        &self,
        enc: &'static TraceEncoder,
        cfg: Option<&EncoderConfig>,
    ) -> Result<(), TraceError> {
        let transport = match enc.transport() {
            Some(transport) => transport,
            None => {
                log::warn!("Encoder {} has no transport", enc.name());
                return Err(TraceError::InvalidState);
            }
        };
        if !transport.is_ready() {
            log::warn!("Transport for encoder {} is not ready", enc.name());
            return Err(TraceError::InvalidState);
        }

        let cfg = cfg.copied().unwrap_or_default();
        self.timeout.store(cfg.timeout.as_micros(), Ordering::Relaxed);
        self.enc
            .store(enc as *const TraceEncoder as *mut TraceEncoder, Ordering::Release);

        log::info!(
            "Initialized encoder {} (timeout {} us)",
            enc.name(),
            cfg.timeout.as_micros()
        );
        Ok(())
    }

    fn write(
        &self,
        enc: Option<&TraceEncoder>,
        data: &[u8],
        timeout: Timeout,
    ) -> Result<(), TraceError> {
        let enc = enc.ok_or(TraceError::InvalidArg)?;
        if !self.is_initialized() {
            return Err(TraceError::InvalidState);
        }
        let transport = enc.transport().ok_or(TraceError::InvalidState)?;
        transport.write(data, timeout)
    }

    fn print_event(
        &self,
        enc: Option<&TraceEncoder>,
        event_name: Option<&str>,
        text: Option<&str>,
    ) -> Result<(), TraceError> {
        let enc = enc.ok_or(TraceError::InvalidArg)?;
        let (event_name, text) = match (event_name, text) {
            (Some(event_name), Some(text)) => (event_name, text),
            _ => return Err(TraceError::InvalidArg),
        };

        let mut msg = TextBuf::<PRINT_EVENT_CAPACITY>::new();
        // TextBuf truncates instead of failing
        let _ = write!(msg, "[{}] {}", event_name, text);
        self.emit_text_to(enc, EventCode::PrintEvent, msg.as_bytes())
    }
}

// =============================================================================
// Per-Event Entry Points
// =============================================================================

macro_rules! ctf_entry_points {
    (
        fixed {
            $( $(#[$fmeta:meta])* $fvariant:ident = $fcode:literal => $fname:ident ( $($arg:ident),* ) ),* $(,)?
        }
        text {
            $( $(#[$tmeta:meta])* $tvariant:ident = $tcode:literal => $tname:ident ( $targ:ident ) ),* $(,)?
        }
    ) => {
        impl CtfEncoder {
            $(
                $(#[$fmeta])*
                #[inline]
                pub fn $fname(&self, $($arg: u32),*) -> Result<(), TraceError> {
                    self.emit(EventCode::$fvariant, &[$($arg),*])
                }
            )*
        }
    };
}

for_each_ctf_event!(ctf_entry_points);
