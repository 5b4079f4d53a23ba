//! Dialect parsers and emitters plus the v1.1 instruction framer.
//!
//! Each dialect submodule owns its own opcode table; the action header
//! decoder (`decode_header`, shared by all three dialects) only knows the
//! generic shape of an action unit: a `u16` type, a `u16` declared
//! length, and the vendor-escape dispatch into NX subtypes.

pub mod nx;
pub mod v10;
pub mod v11;

use crate::diag;
use crate::error::{Error, Result};
use crate::wire::ALIGN;
use byteorder::{BigEndian, ByteOrder};

/// The NX vendor id recognized by the vendor-escape dispatch (`0x00002320`,
/// i.e. the ASCII bytes spelling "Nicira" trimmed into a 32-bit id).
pub const NX_VENDOR_ID: u32 = 0x0000_2320;

/// The decoded, bounds-checked header of one action unit.
pub struct ActionHeader {
    /// The 16-bit opcode (or vendor-escape marker) at `offset + 0`.
    pub opcode: u16,
    /// The declared length at `offset + 2`, already validated against
    /// alignment and the remaining buffer.
    pub len: usize,
}

/// Validate and read the 4-byte generic action header (`type`, `len`) at
/// `offset` in `buf`, given `remaining` bytes available from `offset`.
/// This performs only the dialect-independent checks; opcode-specific
/// size checks happen in the caller.
pub fn decode_header(buf: &[u8], offset: usize, remaining: usize) -> Result<ActionHeader> {
    if remaining < 4 {
        diag::warn_at(offset, "action header truncated");
        return Err(Error::BadLen);
    }
    let len = BigEndian::read_u16(&buf[offset + 2..offset + 4]) as usize;
    if len == 0 || len % ALIGN != 0 || len < 8 || len > remaining {
        diag::warn_at(offset, "bad action length");
        return Err(Error::BadLen);
    }
    let opcode = BigEndian::read_u16(&buf[offset..offset + 2]);
    Ok(ActionHeader { opcode, len })
}

/// Verify the action's declared length against the opcode's expected
/// size: exact match for fixed-size opcodes, `>=` for extensible ones.
pub fn check_size(len: usize, struct_size: usize, extensible: bool, offset: usize) -> Result<()> {
    let ok = if extensible { len >= struct_size } else { len == struct_size };
    if ok {
        Ok(())
    } else {
        diag::warn_at(offset, "action length does not match opcode");
        Err(Error::BadLen)
    }
}

/// Pack `(ofs, n_bits)` into the NXM `ofs_nbits` wire encoding shared by
/// `OUTPUT_REG` and `AUTOPATH`: `(ofs << 6) | (n_bits - 1)`.
pub fn encode_ofs_nbits(ofs: u16, n_bits: u16) -> u16 {
    (ofs << 6) | (n_bits - 1)
}

/// Unpack the NXM `ofs_nbits` wire encoding into `(ofs, n_bits)`.
pub fn decode_ofs_nbits(ofs_nbits: u16) -> (u16, u16) {
    (ofs_nbits >> 6, (ofs_nbits & 0x3f) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ofs_nbits_round_trips() {
        assert_eq!(decode_ofs_nbits(encode_ofs_nbits(5, 16)), (5, 16));
        assert_eq!(decode_ofs_nbits(encode_ofs_nbits(0, 1)), (0, 1));
    }

    #[test]
    fn rejects_misaligned_length() {
        let buf = [0u8, 0, 0, 9, 0, 0, 0, 0, 0];
        assert_eq!(decode_header(&buf, 0, buf.len()), Err(Error::BadLen));
    }

    #[test]
    fn rejects_length_exceeding_buffer() {
        let buf = [0u8, 0, 0, 16, 0, 0, 0, 0];
        assert_eq!(decode_header(&buf, 0, buf.len()), Err(Error::BadLen));
    }
}
