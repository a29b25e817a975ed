//! Cycle counter and core id sampling.
//!
//! Records carry a raw 32-bit cycle count taken when the record is packed, not
//! when the kernel transition happened. The skew is a few hundred cycles at
//! most and the decoder converts to time offline using the clock frequency
//! published in the metadata.
//!
//! - x86-64: RDTSC
//! - ARM64: CNTVCT_EL0
//! - RISC-V 32: `mcycle`
//! - anything else: a software counter that only guarantees ordering

use conquer_once::spin::OnceCell;

use crate::error::TraceError;

/// Source of record timestamps and core ids.
///
/// Implementations are called from every entry point, including interrupt
/// context, so they must not block or allocate.
pub trait CycleClock: Sync {
    /// Current cycle count, truncated to 32 bits.
    fn cycle_count(&self) -> u32;

    /// Index of the core executing the caller.
    fn core_id(&self) -> u8;
}

/// Hardware cycle counter plus the platform's core id reader.
pub struct CpuClock;

impl CycleClock for CpuClock {
    #[inline(always)]
    fn cycle_count(&self) -> u32 {
        trace_timestamp()
    }

    #[inline(always)]
    fn core_id(&self) -> u8 {
        current_core_id()
    }
}

/// Platform hook returning the current core index.
static CORE_ID_SOURCE: OnceCell<fn() -> u8> = OnceCell::uninit();

/// Install the function used to read the current core id.
///
/// Can be set once; later calls fail with `InvalidState`. Until it is set
/// every record reports core 0, which is correct on single-core parts.
pub fn set_core_id_source(source: fn() -> u8) -> Result<(), TraceError> {
    CORE_ID_SOURCE
        .try_init_once(|| source)
        .map_err(|_| TraceError::InvalidState)
}

/// Core id reported by the installed source, or 0.
#[inline(always)]
pub fn current_core_id() -> u8 {
    match CORE_ID_SOURCE.get() {
        Some(source) => source(),
        None => 0,
    }
}

/// Read the current cycle counter, truncated to 32 bits.
///
/// Wraps every 2^32 cycles (about 18 s at 240 MHz); the decoder unwraps using
/// record order.
#[inline(always)]
pub fn trace_timestamp() -> u32 {
    #[cfg(target_arch = "x86_64")]
    {
        // No LFENCE: a few cycles of reordering is within the accepted skew
        let low: u32;
        unsafe {
            core::arch::asm!(
                "rdtsc",
                out("eax") low,
                out("edx") _,
                options(nostack, nomem, preserves_flags)
            );
        }
        low
    }

    #[cfg(target_arch = "aarch64")]
    {
        let val: u64;
        unsafe {
            core::arch::asm!(
                "mrs {}, cntvct_el0",
                out(reg) val,
                options(nomem, nostack)
            );
        }
        val as u32
    }

    #[cfg(target_arch = "riscv32")]
    {
        let val: u32;
        unsafe {
            core::arch::asm!(
                "csrr {}, mcycle",
                out(reg) val,
                options(nomem, nostack)
            );
        }
        val
    }

    #[cfg(not(any(
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "riscv32"
    )))]
    {
        use core::sync::atomic::{AtomicU32, Ordering};
        static SOFT_COUNTER: AtomicU32 = AtomicU32::new(0);
        SOFT_COUNTER.fetch_add(1, Ordering::Relaxed)
    }
}

/// Convert a cycle delta to nanoseconds for a counter running at `freq_hz`.
///
/// Returns 0 if the frequency is unknown.
pub fn cycles_to_nanos(delta: u32, freq_hz: u64) -> u64 {
    if freq_hz == 0 {
        return 0;
    }
    // 128-bit intermediate avoids overflow for any u32 delta
    ((delta as u128 * 1_000_000_000) / freq_hz as u128) as u64
}
