//! Narrow interfaces for the NX sub-codecs whose own semantics are out of
//! scope: `bundle`, `learn`, `multipath`, `reg_move`, `reg_load`. Each is
//! represented as an [`Opaque`] blob. This crate loses no bytes, but it
//! cannot decode, check, or format their fields beyond the placeholders
//! below.

use crate::error::Result;
use crate::model::Opaque;

/// Take ownership of a sub-codec's body (everything in the action after
/// the common NX vendor header) without interpreting it.
pub fn from_wire(body: &[u8]) -> Result<Opaque> {
    Ok(Opaque { head: body.to_vec() })
}

/// Write a sub-codec's body back out verbatim. Header framing (type,
/// length, vendor id, subtype) and alignment padding are the caller's
/// responsibility (see `action::nx`), mirroring how `note`'s two-phase
/// write is split between the generic entry writer and the note-specific
/// payload.
pub fn to_wire(opaque: &Opaque, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&opaque.head);
}

/// The real semantic checks for these sub-codecs live in their own
/// out-of-scope crates; this always succeeds.
pub fn check(_opaque: &Opaque) -> Result<()> {
    Ok(())
}

/// Render a placeholder rather than the sub-codec's true syntax.
pub fn format(name: &str, opaque: &Opaque, text: &mut String) {
    text.push_str(name);
    text.push('(');
    text.push_str(&opaque.head.len().to_string());
    text.push_str(" bytes)");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_raw_bytes() {
        let body = [1u8, 2, 3, 4];
        let opaque = from_wire(&body).unwrap();
        let mut out = Vec::new();
        to_wire(&opaque, &mut out);
        assert_eq!(out, body);
    }

    #[test]
    fn format_is_a_byte_count_placeholder() {
        let opaque = Opaque { head: vec![0; 12] };
        let mut s = String::new();
        format("learn", &opaque, &mut s);
        assert_eq!(s, "learn(12 bytes)");
    }
}
