//! Event code space.
//!
//! Each kernel lifecycle transition has a stable 8-bit code and a fixed,
//! ordered field list. The decoder matches on the code byte and derives the
//! record length from the field list, so a code's value and signature must
//! never change once shipped.
//!
//! # Code ranges
//!
//! - 0x10-0x1E: interrupt, delay and notification events
//! - 0x1F-0x2E: queue and semaphore events
//! - 0x2F-0x38: stream buffer events
//! - 0x39-0x42: task lifecycle and scheduler list events
//! - 0x43: formatted text

use crate::macros::for_each_ctf_event;
use crate::record::HEADER_SIZE;

/// Wire type of a single event field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// 8-bit unsigned integer
    U8,
    /// 32-bit unsigned integer; pointer-sized values are truncated or widened into it
    U32,
    /// NUL-terminated byte string, bounded by `PRINT_EVENT_CAPACITY`
    Text,
}

impl FieldKind {
    /// Encoded width in bytes, or `None` for variable-length text.
    pub const fn width(self) -> Option<usize> {
        match self {
            FieldKind::U8 => Some(1),
            FieldKind::U32 => Some(4),
            FieldKind::Text => None,
        }
    }
}

/// A named field in an event's signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

macro_rules! define_event_codes {
    (
        fixed {
            $( $(#[$fmeta:meta])* $fvariant:ident = $fcode:literal => $fname:ident ( $($arg:ident),* ) ),* $(,)?
        }
        text {
            $( $(#[$tmeta:meta])* $tvariant:ident = $tcode:literal => $tname:ident ( $targ:ident ) ),* $(,)?
        }
    ) => {
        /// Kernel event identifier carried in every record header.
        #[repr(u8)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum EventCode {
            $( $(#[$fmeta])* $fvariant = $fcode, )*
            $( $(#[$tmeta])* $tvariant = $tcode, )*
        }

        impl EventCode {
            /// Every defined code, in ascending order.
            pub const ALL: &'static [EventCode] = &[
                $( EventCode::$fvariant, )*
                $( EventCode::$tvariant, )*
            ];

            /// Event name as it appears in metadata and dumps.
            pub const fn name(self) -> &'static str {
                match self {
                    $( EventCode::$fvariant => stringify!($fname), )*
                    $( EventCode::$tvariant => stringify!($tname), )*
                }
            }

            /// Look up a code from its wire value.
            pub const fn from_u8(raw: u8) -> Option<EventCode> {
                match raw {
                    $( $fcode => Some(EventCode::$fvariant), )*
                    $( $tcode => Some(EventCode::$tvariant), )*
                    _ => None,
                }
            }

            /// Ordered field signature following the header.
            pub const fn fields(self) -> &'static [Field] {
                match self {
                    $( EventCode::$fvariant => &[
                        $( Field { name: stringify!($arg), kind: FieldKind::U32 }, )*
                    ], )*
                    $( EventCode::$tvariant => &[
                        Field { name: stringify!($targ), kind: FieldKind::Text },
                    ], )*
                }
            }
        }
    };
}

for_each_ctf_event!(define_event_codes);

impl EventCode {
    /// Wire value of this code.
    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether the signature contains a variable-length text field.
    pub const fn has_text(self) -> bool {
        let fields = self.fields();
        let mut i = 0;
        while i < fields.len() {
            if matches!(fields[i].kind, FieldKind::Text) {
                return true;
            }
            i += 1;
        }
        false
    }

    /// Total record size (header included) for fixed-size events.
    ///
    /// Returns `None` for events with a text field; their size depends on the
    /// payload and is found by scanning for the terminator.
    pub const fn record_size(self) -> Option<usize> {
        let fields = self.fields();
        let mut size = HEADER_SIZE;
        let mut i = 0;
        while i < fields.len() {
            match fields[i].kind.width() {
                Some(width) => size += width,
                None => return None,
            }
            i += 1;
        }
        Some(size)
    }
}
