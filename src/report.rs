//! Writing the timestamp artifact.
//!
//! The layout is fixed down to the byte — a tab before each bracket, two
//! tabs before each element, the closing brace on its own line — so runs
//! can be compared against golden files. Every element is a nanosecond
//! count from the monotonic clock.

use std::io::{self, Write};

use crate::probe::Pair;


/// Writes the probe artifact: every send in send order, every receive in
/// arrival order, and one pair per slot — `[sent]` for an unanswered
/// query, `[sent, received, delta]` otherwise.
pub fn probe_report<W: Write>(out: &mut W, sends: &[u64], receives: &[u64], pairs: &[Pair]) -> io::Result<()> {
    write!(out, "{{\"sends\":\n\t[")?;
    write_timestamps(out, sends)?;

    write!(out, "],\n \"receives\":\n\t[")?;
    write_timestamps(out, receives)?;

    write!(out, "],\n \"pairs\":\n\t[")?;
    for (index, pair) in pairs.iter().enumerate() {
        if pair.answer > 0 {
            write!(out, "\n\t\t[{}, {}, {}]", pair.sent, pair.received, pair.received - pair.sent)?;
        }
        else {
            write!(out, "\n\t\t[{}]", pair.sent)?;
        }

        out.write_all(if index + 1 == pairs.len() { b"\n\t" } else { b"," })?;
    }

    write!(out, "]\n}}\n")
}

/// Writes the reflector artifact: receive timestamps, then send
/// timestamps, both in event order.
pub fn timestamps_report<W: Write>(out: &mut W, receives: &[u64], sends: &[u64]) -> io::Result<()> {
    write!(out, "{{\"receives\":\n\t[")?;
    write_timestamps(out, receives)?;

    write!(out, "],\n \"sends\":\n\t[")?;
    write_timestamps(out, sends)?;

    write!(out, "]\n}}\n")
}

fn write_timestamps<W: Write>(out: &mut W, timestamps: &[u64]) -> io::Result<()> {
    for (index, timestamp) in timestamps.iter().enumerate() {
        write!(out, "\n\t\t{}", timestamp)?;
        out.write_all(if index + 1 == timestamps.len() { b"\n\t" } else { b"," })?;
    }

    Ok(())
}
