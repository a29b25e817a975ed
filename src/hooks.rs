//! Kernel-hook surface.
//!
//! One free function per event, called inline from the scheduler, queue and
//! interrupt code at the matching transition. Each forwards its arguments to
//! the ctf encoder, which samples the timestamp and core id, packs the record
//! and writes it with the configured timeout. Pointer-sized arguments (task
//! handles, queue handles, output-parameter addresses) are passed as their
//! 32-bit address value.
//!
//! The hooks are bound to the ctf encoder itself, not to whichever encoder
//! `TRACER` has active. They only record when "ctf" is the active encoder;
//! with any other encoder active, or none, every hook returns `InvalidState`
//! and writes nothing. Other encoders provide their own entry points.
//!
//! Every hook returns the write result. Kernel call sites normally discard it:
//! a failed trace write must never change the traced operation.
//!
//! ```rust,ignore
//! // in the context switch path
//! let _ = rtos_trace::hooks::task_switched_in(next_tcb as u32);
//! ```
//!
//! With the `ffi` feature, `hooks::ffi` exports the same hooks to C as
//! `esp_trace_ctf_<event>`, returning the integer result code.

use crate::encoder::ctf::CTF_ENCODER;
use crate::error::TraceError;
use crate::event::EventCode;
use crate::macros::for_each_ctf_event;

macro_rules! kernel_hooks {
    (
        fixed {
            $( $(#[$fmeta:meta])* $fvariant:ident = $fcode:literal => $fname:ident ( $($arg:ident),* ) ),* $(,)?
        }
        text {
            $( $(#[$tmeta:meta])* $tvariant:ident = $tcode:literal => $tname:ident ( $targ:ident ) ),* $(,)?
        }
    ) => {
        $(
            $(#[$fmeta])*
            #[inline]
            pub fn $fname($($arg: u32),*) -> Result<(), TraceError> {
                CTF_ENCODER.$fname($($arg),*)
            }
        )*

        $(
            $(#[$tmeta])*
            ///
            /// The payload is stored up to its first NUL, truncated to
            /// `PRINT_EVENT_CAPACITY - 1` bytes.
            pub fn $tname($targ: &[u8]) -> Result<(), TraceError> {
                CTF_ENCODER.emit_text(EventCode::$tvariant, $targ)
            }
        )*

        /// C exports of the kernel hooks.
        ///
        /// Each returns 0 on success or `TraceError::code()`.
        #[cfg(feature = "ffi")]
        pub mod ffi {
            use core::ffi::{c_char, CStr};

            use crate::error::TraceError;

            fn result_code(result: Result<(), TraceError>) -> i32 {
                match result {
                    Ok(()) => 0,
                    Err(err) => err.code(),
                }
            }

            $(
                $(#[$fmeta])*
                #[export_name = concat!("esp_trace_ctf_", stringify!($fname))]
                pub extern "C" fn $fname($($arg: u32),*) -> i32 {
                    result_code(super::$fname($($arg),*))
                }
            )*

            $(
                $(#[$tmeta])*
                ///
                /// A null pointer yields the invalid-argument code.
                ///
                /// # Safety
                ///
                /// A non-null pointer must reference a NUL-terminated string
                /// that stays valid for the duration of the call.
                #[export_name = concat!("esp_trace_ctf_", stringify!($tname))]
                pub unsafe extern "C" fn $tname($targ: *const c_char) -> i32 {
                    if $targ.is_null() {
                        return TraceError::InvalidArg.code();
                    }
                    let text = CStr::from_ptr($targ);
                    result_code(super::$tname(text.to_bytes()))
                }
            )*
        }
    };
}

for_each_ctf_event!(kernel_hooks);
