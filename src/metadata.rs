//! CTF 1.8 metadata for the record stream.
//!
//! Trace viewers need a TSDL description before they can read the binary
//! stream. It is generated from the event table, so it always matches what
//! the encoder writes: header `{timestamp, id}`, per-event context
//! `{core_id}`, then the event's fields.

use core::fmt::{self, Write};

use crate::event::{EventCode, FieldKind};

/// Name of the clock the record timestamps are mapped to.
pub const CLOCK_NAME: &str = "cycle_counter";

fn byte_order() -> &'static str {
    if cfg!(target_endian = "big") {
        "be"
    } else {
        "le"
    }
}

fn type_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::U8 => "uint8_t",
        FieldKind::U32 => "uint32_t",
        FieldKind::Text => "string",
    }
}

/// Write the TSDL metadata for a target whose cycle counter runs at
/// `clock_freq_hz`.
pub fn write_metadata<W: Write>(out: &mut W, clock_freq_hz: u64) -> fmt::Result {
    writeln!(out, "/* CTF 1.8 */")?;
    writeln!(out)?;
    writeln!(out, "typealias integer {{ size = 8; align = 8; signed = false; }} := uint8_t;")?;
    writeln!(out, "typealias integer {{ size = 32; align = 8; signed = false; }} := uint32_t;")?;
    writeln!(out)?;

    writeln!(out, "trace {{")?;
    writeln!(out, "\tmajor = 1;")?;
    writeln!(out, "\tminor = 8;")?;
    writeln!(out, "\tbyte_order = {};", byte_order())?;
    writeln!(out, "}};")?;
    writeln!(out)?;

    writeln!(out, "clock {{")?;
    writeln!(out, "\tname = {};", CLOCK_NAME)?;
    writeln!(out, "\tfreq = {};", clock_freq_hz)?;
    writeln!(out, "}};")?;
    writeln!(out)?;
    writeln!(
        out,
        "typealias integer {{ size = 32; align = 8; signed = false; map = clock.{}.value; }} := {}_t;",
        CLOCK_NAME, CLOCK_NAME
    )?;
    writeln!(out)?;

    writeln!(out, "stream {{")?;
    writeln!(out, "\tevent.header := struct {{")?;
    writeln!(out, "\t\t{}_t timestamp;", CLOCK_NAME)?;
    writeln!(out, "\t\tuint8_t id;")?;
    writeln!(out, "\t}};")?;
    writeln!(out, "\tevent.context := struct {{")?;
    writeln!(out, "\t\tuint8_t core_id;")?;
    writeln!(out, "\t}};")?;
    writeln!(out, "}};")?;

    for code in EventCode::ALL {
        writeln!(out)?;
        writeln!(out, "event {{")?;
        writeln!(out, "\tname = \"{}\";", code.name())?;
        writeln!(out, "\tid = {};", code.as_u8())?;
        writeln!(out, "\tfields := struct {{")?;
        for field in code.fields() {
            writeln!(out, "\t\t{} {};", type_name(field.kind), field.name)?;
        }
        writeln!(out, "\t}};")?;
        writeln!(out, "}};")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    fn metadata() -> String {
        let mut out = String::new();
        write_metadata(&mut out, 240_000_000).unwrap();
        out
    }

    #[test]
    fn starts_with_magic_and_trace_block() {
        let out = metadata();
        assert!(out.starts_with("/* CTF 1.8 */\n"));
        assert!(out.contains("\tmajor = 1;\n\tminor = 8;\n"));
        assert!(out.contains("\tfreq = 240000000;\n"));
    }

    #[test]
    fn header_matches_record_layout() {
        let out = metadata();
        assert!(out.contains(
            "\tevent.header := struct {\n\t\tcycle_counter_t timestamp;\n\t\tuint8_t id;\n\t};"
        ));
        assert!(out.contains("\tevent.context := struct {\n\t\tuint8_t core_id;\n\t};"));
    }

    #[test]
    fn one_event_block_per_code() {
        let out = metadata();
        assert_eq!(out.matches("\nevent {\n").count(), EventCode::ALL.len());
        assert!(out.contains(
            "\tname = \"task_switched_in\";\n\tid = 60;\n\tfields := struct {\n\t\tuint32_t tcb;\n\t};"
        ));
        assert!(out.contains("\tname = \"idle\";\n\tid = 61;\n\tfields := struct {\n\t};"));
        assert!(out.contains("\t\tstring msg;\n"));
    }
}
