//! NX vendor-extension family: per-subtype struct sizes, body decoding,
//! and emission. Reachable from both the v1.0 and v1.1 parsers via the
//! vendor-escape dispatch.

use byteorder::{BigEndian, ByteOrder};

use super::{check_size, decode_ofs_nbits, encode_ofs_nbits, NX_VENDOR_ID};
use crate::collab::field_registry;
use crate::collab::subcodec;
use crate::diag;
use crate::error::{Error, Result};
use crate::model::{CompatTag, Entry, FieldRef};
use crate::wire::pad_len;

/// The 16-bit value both dialects use to escape into a vendor/experimenter
/// action (`OFPAT10_VENDOR` and `OFPAT11_EXPERIMENTER` share this value).
pub const VENDOR_ESCAPE: u16 = 0xffff;

/// Bytes of the common NX action header: `type` (2) + `len` (2) +
/// `vendor` (4) + `subtype` (2).
const NX_HEADER_LEN: usize = 10;

pub const SNAT_OBSOLETE: u16 = 0;
pub const RESUBMIT: u16 = 1;
pub const SET_TUNNEL: u16 = 2;
pub const DROP_SPOOFED_ARP_OBSOLETE: u16 = 3;
pub const SET_QUEUE: u16 = 4;
pub const POP_QUEUE: u16 = 5;
pub const REG_MOVE: u16 = 6;
pub const REG_LOAD: u16 = 7;
pub const NOTE: u16 = 8;
pub const SET_TUNNEL64: u16 = 9;
pub const MULTIPATH: u16 = 10;
pub const AUTOPATH: u16 = 11;
pub const BUNDLE: u16 = 12;
pub const BUNDLE_LOAD: u16 = 13;
pub const RESUBMIT_TABLE: u16 = 14;
pub const OUTPUT_REG: u16 = 15;
pub const LEARN: u16 = 16;
pub const EXIT: u16 = 17;
pub const DEC_TTL: u16 = 18;
pub const FIN_TIMEOUT: u16 = 19;
pub const CONTROLLER: u16 = 20;

/// `(struct_size, extensible)` per NX subtype.
fn subtype_size(subtype: u16) -> Option<(usize, bool)> {
    match subtype {
        RESUBMIT => Some((16, false)),
        SET_TUNNEL => Some((16, false)),
        SET_QUEUE => Some((16, false)),
        POP_QUEUE => Some((16, false)),
        REG_MOVE => Some((24, false)),
        REG_LOAD => Some((24, false)),
        NOTE => Some((16, true)),
        SET_TUNNEL64 => Some((24, false)),
        MULTIPATH => Some((32, false)),
        AUTOPATH => Some((24, false)),
        BUNDLE | BUNDLE_LOAD => Some((32, true)),
        RESUBMIT_TABLE => Some((16, false)),
        OUTPUT_REG => Some((24, false)),
        LEARN => Some((32, true)),
        EXIT => Some((16, false)),
        DEC_TTL => Some((16, false)),
        FIN_TIMEOUT => Some((16, false)),
        CONTROLLER => Some((16, false)),
        _ => None,
    }
}

/// Validate the vendor-escape action at `buf[offset..offset+len]` and
/// return its subtype.
pub fn decode_vendor(buf: &[u8], offset: usize, len: usize) -> Result<u16> {
    if len < NX_HEADER_LEN {
        diag::warn_at(offset, "NX action shorter than its header");
        return Err(Error::BadLen);
    }
    let vendor = BigEndian::read_u32(&buf[offset + 4..offset + 8]);
    if vendor != NX_VENDOR_ID {
        diag::warn_at(offset, "non-NX vendor id");
        return Err(Error::BadVendor);
    }
    let subtype = BigEndian::read_u16(&buf[offset + 8..offset + 10]);
    if subtype == SNAT_OBSOLETE || subtype == DROP_SPOOFED_ARP_OBSOLETE {
        diag::warn_at(offset, "obsolete NX subtype");
        return Err(Error::BadType);
    }
    match subtype_size(subtype) {
        Some((struct_size, extensible)) => {
            check_size(len, struct_size, extensible, offset)?;
            Ok(subtype)
        }
        None => {
            diag::warn_at(offset, "unknown NX subtype");
            Err(Error::BadType)
        }
    }
}

/// Decode the body (everything after the 10-byte common header) of an NX
/// action into an [`Entry`].
pub fn decode_body(subtype: u16, buf: &[u8], offset: usize, len: usize) -> Result<Entry> {
    let body = &buf[offset + NX_HEADER_LEN..offset + len];
    Ok(match subtype {
        RESUBMIT => Entry::Resubmit {
            in_port: BigEndian::read_u16(&body[0..2]),
            table_id: 0xff,
            compat_hint: CompatTag::NxResubmit,
        },
        RESUBMIT_TABLE => {
            if body[3] != 0 || body[4] != 0 || body[5] != 0 {
                diag::warn_at(offset, "non-zero RESUBMIT_TABLE pad");
                return Err(Error::BadArgument);
            }
            Entry::Resubmit {
                in_port: BigEndian::read_u16(&body[0..2]),
                table_id: body[2],
                compat_hint: CompatTag::NxResubmitTable,
            }
        }
        SET_TUNNEL => Entry::SetTunnel {
            tun_id: u64::from(BigEndian::read_u32(&body[0..4])),
            compat_hint: CompatTag::NxSetTunnel,
        },
        SET_TUNNEL64 => Entry::SetTunnel {
            tun_id: BigEndian::read_u64(&body[6..14]),
            compat_hint: CompatTag::NxSetTunnel64,
        },
        SET_QUEUE => Entry::SetQueue { queue_id: BigEndian::read_u32(&body[0..4]) },
        POP_QUEUE => Entry::PopQueue,
        DEC_TTL => Entry::DecTtl,
        EXIT => Entry::Exit,
        CONTROLLER => Entry::Controller {
            max_len: BigEndian::read_u16(&body[0..2]),
            controller_id: BigEndian::read_u16(&body[2..4]),
            reason: body[4],
        },
        FIN_TIMEOUT => Entry::FinTimeout {
            idle: BigEndian::read_u16(&body[0..2]),
            hard: BigEndian::read_u16(&body[2..4]),
        },
        NOTE => Entry::Note { bytes: body.to_vec() },
        OUTPUT_REG => {
            let zero = &body[8..14];
            if zero.iter().any(|b| *b != 0) {
                diag::warn_at(offset, "non-zero OUTPUT_REG reserved field");
                return Err(Error::BadArgument);
            }
            let (ofs, n_bits) = decode_ofs_nbits(BigEndian::read_u16(&body[0..2]));
            let src = FieldRef {
                field_id: field_registry::field_from_nxm_header(BigEndian::read_u32(&body[2..6])).0,
                offset: ofs,
                n_bits,
            };
            field_registry::check_src(&src, None)?;
            Entry::OutputReg { src, max_len: BigEndian::read_u16(&body[6..8]) }
        }
        AUTOPATH => {
            let (ofs, n_bits) = decode_ofs_nbits(BigEndian::read_u16(&body[0..2]));
            let dst = FieldRef {
                field_id: field_registry::field_from_nxm_header(BigEndian::read_u32(&body[2..6])).0,
                offset: ofs,
                n_bits,
            };
            let port = BigEndian::read_u32(&body[6..10]);
            Entry::Autopath { port, dst }
        }
        REG_MOVE => Entry::RegMove(subcodec::from_wire(body)?),
        REG_LOAD => Entry::RegLoad(subcodec::from_wire(body)?),
        MULTIPATH => Entry::Multipath(subcodec::from_wire(body)?),
        BUNDLE | BUNDLE_LOAD => Entry::Bundle(subcodec::from_wire(body)?),
        LEARN => Entry::Learn(subcodec::from_wire(body)?),
        _ => unreachable!("decode_vendor already rejected unknown subtypes"),
    })
}

fn push_header(out: &mut Vec<u8>, subtype: u16, len: u16) {
    let mut hdr = [0u8; NX_HEADER_LEN];
    BigEndian::write_u16(&mut hdr[0..2], VENDOR_ESCAPE);
    BigEndian::write_u16(&mut hdr[2..4], len);
    BigEndian::write_u32(&mut hdr[4..8], NX_VENDOR_ID);
    BigEndian::write_u16(&mut hdr[8..10], subtype);
    out.extend_from_slice(&hdr);
}

/// Emit a fixed-size NX action: write the header with `struct_size` as
/// its length, then `body` (zero-padded/truncated to fill the struct).
fn emit_fixed(out: &mut Vec<u8>, subtype: u16, struct_size: usize, body: &[u8]) {
    push_header(out, subtype, struct_size as u16);
    out.extend_from_slice(body);
    let written = NX_HEADER_LEN + body.len();
    out.resize(out.len() + (struct_size - written), 0);
}

/// Emit a variable-length NX action: reserve the header, append `body`,
/// pad to the next `A`-aligned boundary, then back-patch `len`.
fn emit_variable(out: &mut Vec<u8>, subtype: u16, body: &[u8]) {
    let start = out.len();
    push_header(out, subtype, 0);
    out.extend_from_slice(body);
    let unpadded = out.len() - start;
    out.resize(out.len() + pad_len(unpadded), 0);
    let total_len = (out.len() - start) as u16;
    BigEndian::write_u16(&mut out[start + 2..start + 4], total_len);
}

/// Emit an [`Entry`] as its NX vendor-subtype wire encoding. Returns
/// `false` if `entry` has no NX encoding (only `Entry::End` and
/// plain-field entries with a native v1.0/v1.1 opcode fall in that
/// category; callers route those elsewhere).
pub fn emit(entry: &Entry, out: &mut Vec<u8>) -> bool {
    match entry {
        Entry::Controller { max_len, controller_id, reason } => {
            let mut body = [0u8; 6];
            BigEndian::write_u16(&mut body[0..2], *max_len);
            BigEndian::write_u16(&mut body[2..4], *controller_id);
            body[4] = *reason;
            emit_fixed(out, CONTROLLER, 16, &body);
        }
        Entry::OutputReg { src, max_len } => {
            let mut body = [0u8; 14];
            BigEndian::write_u16(&mut body[0..2], encode_ofs_nbits(src.offset, src.n_bits));
            BigEndian::write_u32(&mut body[2..6], src.field_id);
            BigEndian::write_u16(&mut body[6..8], *max_len);
            emit_fixed(out, OUTPUT_REG, 24, &body);
        }
        Entry::RegMove(opaque) => emit_fixed(out, REG_MOVE, 24, &opaque.head),
        Entry::RegLoad(opaque) => emit_fixed(out, REG_LOAD, 24, &opaque.head),
        Entry::Multipath(opaque) => emit_fixed(out, MULTIPATH, 32, &opaque.head),
        Entry::Bundle(opaque) => {
            let mut body = Vec::new();
            subcodec::to_wire(opaque, &mut body);
            emit_variable(out, BUNDLE, &body);
        }
        Entry::Learn(opaque) => {
            let mut body = Vec::new();
            subcodec::to_wire(opaque, &mut body);
            emit_variable(out, LEARN, &body);
        }
        Entry::DecTtl => emit_fixed(out, DEC_TTL, 16, &[]),
        Entry::SetTunnel { tun_id, compat_hint } => {
            if *tun_id <= u64::from(u32::MAX) && *compat_hint != CompatTag::NxSetTunnel64 {
                let mut body = [0u8; 4];
                BigEndian::write_u32(&mut body, *tun_id as u32);
                emit_fixed(out, SET_TUNNEL, 16, &body);
            } else {
                let mut body = [0u8; 14];
                BigEndian::write_u64(&mut body[6..14], *tun_id);
                emit_fixed(out, SET_TUNNEL64, 24, &body);
            }
        }
        Entry::SetQueue { queue_id } => {
            let mut body = [0u8; 4];
            BigEndian::write_u32(&mut body, *queue_id);
            emit_fixed(out, SET_QUEUE, 16, &body);
        }
        Entry::PopQueue => emit_fixed(out, POP_QUEUE, 16, &[]),
        Entry::FinTimeout { idle, hard } => {
            let mut body = [0u8; 4];
            BigEndian::write_u16(&mut body[0..2], *idle);
            BigEndian::write_u16(&mut body[2..4], *hard);
            emit_fixed(out, FIN_TIMEOUT, 16, &body);
        }
        Entry::Resubmit { in_port, table_id, compat_hint } => {
            if *table_id == 0xff && *compat_hint != CompatTag::NxResubmitTable {
                let mut body = [0u8; 2];
                BigEndian::write_u16(&mut body, *in_port);
                emit_fixed(out, RESUBMIT, 16, &body);
            } else {
                let mut body = [0u8; 5];
                BigEndian::write_u16(&mut body[0..2], *in_port);
                body[2] = *table_id;
                emit_fixed(out, RESUBMIT_TABLE, 16, &body);
            }
        }
        Entry::Autopath { port, dst } => {
            let mut body = [0u8; 10];
            BigEndian::write_u16(&mut body[0..2], encode_ofs_nbits(dst.offset, dst.n_bits));
            BigEndian::write_u32(&mut body[2..6], dst.field_id);
            BigEndian::write_u32(&mut body[6..10], *port);
            emit_fixed(out, AUTOPATH, 24, &body);
        }
        Entry::Note { bytes } => emit_variable(out, NOTE, bytes),
        Entry::Exit => emit_fixed(out, EXIT, 16, &[]),
        _ => return false,
    }
    true
}
