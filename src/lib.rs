//! CTF event tracer for a real-time multitasking kernel.
//!
//! Turns scheduler, queue, stream-buffer, notification and interrupt
//! transitions into a compact binary record stream for offline trace viewers.
//! Every entry point may run in interrupt context: nothing here allocates,
//! takes a lock on the hot path, or logs.
//!
//! # Design Principles
//!
//! 1. **Byte-exact wire format**: `[timestamp u32][code u8][core u8][fields]`,
//!    native byte order, no framing
//! 2. **One event table**: codes, entry points, C exports, decoder and
//!    metadata all expand from `for_each_ctf_event!`
//! 3. **Pluggable sinks**: encoders write through a `Transport`, selected by
//!    name at startup
//! 4. **Single activation**: one encoder is active for the whole run
//!
//! # Architecture
//!
//! ```text
//! +-------------------+     +-------------------+     +-------------------+
//! |   KERNEL HOOKS    |     |   trace_event!    |     |   C CALLERS (ffi) |
//! |  - task_*         |     |  "[name] text"    |     |  esp_trace_ctf_*  |
//! |  - queue_*, isr_* |     |                   |     |                   |
//! +--------+----------+     +--------+----------+     +--------+----------+
//!          |                         |                         |
//!          v                         v                         v
//! +------------------------------------------------------------------------+
//! |                      CTF ENCODER (encoder::ctf)                        |
//! |  cycle counter + core id sample | record packing | write statistics    |
//! +-----------------------------------+------------------------------------+
//!                                     |
//!                                     v
//! +------------------------------------------------------------------------+
//! |            TRANSPORT (UART, JTAG channel, RingTransport)               |
//! +------------------------------------------------------------------------+
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use rtos_trace::registry::{self, OpenParams, TRACER};
//! use rtos_trace::transport::ring::RingTransport;
//!
//! static RING: RingTransport<4096> = RingTransport::new();
//!
//! registry::init()?;
//! TRACER.register_transport("ring", &RING)?;
//! TRACER.open(&OpenParams::new("ctf", "ring"))?;
//!
//! // Kernel hook call sites
//! let _ = rtos_trace::hooks::task_switched_in(tcb as u32);
//! let _ = rtos_trace::trace_event!("sensor", "temperature: {}", 25);
//! ```
//!
//! # Dump Format
//!
//! `decode::RecordIter` turns a captured stream back into records, printed as:
//!
//! ```text
//! [TRACE] CPU0 ts=1234567890 id=0x3c task_switched_in tcb=0x3ffb2000
//! [TRACE] CPU1 ts=1234567900 id=0x43 print_event msg="[sensor] temperature: 25"
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

mod macros;

pub mod decode;
pub mod encoder;
pub mod error;
pub mod event;
pub mod hooks;
pub mod metadata;
pub mod record;
pub mod registry;
pub mod text;
pub mod timestamp;
pub mod transport;

#[cfg(test)]
mod testing;

pub use encoder::ctf::{CtfEncoder, CTF_ENCODER};
pub use encoder::{EncoderConfig, EncoderOps, TraceEncoder};
pub use error::{DecodeError, TraceError};
pub use event::EventCode;
pub use registry::{init, OpenParams, Tracer, TRACER};
pub use transport::{Timeout, Transport};
