//! OpenFlow v1.1 action dialect and instruction framer.

use byteorder::{BigEndian, ByteOrder};

use super::{decode_header, check_size, nx};
use crate::collab::port;
use crate::diag;
use crate::error::{Error, Result};
use crate::model::{Actlist, Entry};
use crate::wire::{pad_len, ALIGN};

pub const OUTPUT: u16 = 0;
pub const SET_VLAN_VID: u16 = 1;
pub const SET_VLAN_PCP: u16 = 2;
pub const SET_DL_SRC: u16 = 3;
pub const SET_DL_DST: u16 = 4;
pub const SET_NW_SRC: u16 = 5;
pub const SET_NW_DST: u16 = 6;
pub const SET_NW_TOS: u16 = 7;
pub const SET_TP_SRC: u16 = 8;
pub const SET_TP_DST: u16 = 9;
pub const EXPERIMENTER: u16 = nx::VENDOR_ESCAPE;

const DSCP_MASK: u8 = 0xfc;

/// Instruction kinds recognized by the v1.1 instruction framer.
const GOTO_TABLE: u16 = 1;
const WRITE_METADATA: u16 = 2;
const WRITE_ACTIONS: u16 = 3;
const APPLY_ACTIONS: u16 = 4;
const CLEAR_ACTIONS: u16 = 5;
const EXPERIMENTER_INST: u16 = 0xffff;

fn opcode_size(opcode: u16) -> Option<(usize, bool)> {
    match opcode {
        OUTPUT => Some((16, false)),
        SET_VLAN_VID => Some((8, false)),
        SET_VLAN_PCP => Some((8, false)),
        SET_DL_SRC | SET_DL_DST => Some((16, false)),
        SET_NW_SRC | SET_NW_DST => Some((8, false)),
        SET_NW_TOS => Some((8, false)),
        SET_TP_SRC | SET_TP_DST => Some((8, false)),
        _ => None,
    }
}

fn mac_at(buf: &[u8], offset: usize) -> [u8; 6] {
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&buf[offset..offset + 6]);
    mac
}

fn decode_body(opcode: u16, buf: &[u8], offset: usize) -> Result<Entry> {
    Ok(match opcode {
        OUTPUT => {
            let raw_port = BigEndian::read_u32(&buf[offset + 4..offset + 8]);
            let max_len = BigEndian::read_u16(&buf[offset + 8..offset + 10]);
            let mapped = port::remap_port_from_v11(raw_port)?;
            port::check_output_port(mapped, port::MAX_PHYS_PORT)?;
            Entry::Output { port: mapped, max_len }
        }
        SET_VLAN_VID => {
            let vid = BigEndian::read_u16(&buf[offset + 4..offset + 6]);
            if vid & 0xf000 != 0 {
                diag::warn_at(offset, "SET_VLAN_VID reserved bits set");
                return Err(Error::BadArgument);
            }
            Entry::SetVlanVid { vlan_vid: vid }
        }
        SET_VLAN_PCP => {
            let pcp = buf[offset + 4];
            if pcp & !0x07 != 0 {
                diag::warn_at(offset, "SET_VLAN_PCP reserved bits set");
                return Err(Error::BadArgument);
            }
            Entry::SetVlanPcp { vlan_pcp: pcp }
        }
        SET_DL_SRC => Entry::SetEthSrc { mac: mac_at(buf, offset + 4) },
        SET_DL_DST => Entry::SetEthDst { mac: mac_at(buf, offset + 4) },
        SET_NW_SRC => Entry::SetIpv4Src { ipv4: BigEndian::read_u32(&buf[offset + 4..offset + 8]) },
        SET_NW_DST => Entry::SetIpv4Dst { ipv4: BigEndian::read_u32(&buf[offset + 4..offset + 8]) },
        SET_NW_TOS => {
            let tos = buf[offset + 4];
            if tos & !DSCP_MASK != 0 {
                diag::warn_at(offset, "SET_NW_TOS outside DSCP mask");
                return Err(Error::BadArgument);
            }
            Entry::SetIpv4Dscp { dscp: tos }
        }
        SET_TP_SRC => Entry::SetL4SrcPort { port: BigEndian::read_u16(&buf[offset + 4..offset + 6]) },
        SET_TP_DST => Entry::SetL4DstPort { port: BigEndian::read_u16(&buf[offset + 4..offset + 6]) },
        _ => unreachable!("opcode_size already rejected unknown opcodes"),
    })
}

/// Parse `actions_len` bytes of v1.1 actions (the `APPLY_ACTIONS` payload)
/// into `actlist`, appending `END`. Shared by [`parse_instructions`] and
/// directly testable on its own.
fn parse_actions(bytes: &[u8], actions_len: usize, actlist: &mut Actlist) -> Result<()> {
    let mut offset = 0;
    while offset < actions_len {
        let remaining = actions_len - offset;
        let header = decode_header(bytes, offset, remaining)?;
        let entry = if header.opcode == EXPERIMENTER {
            let subtype = nx::decode_vendor(bytes, offset, header.len)?;
            nx::decode_body(subtype, bytes, offset, header.len)?
        } else {
            match opcode_size(header.opcode) {
                Some((struct_size, extensible)) => {
                    check_size(header.len, struct_size, extensible, offset)?;
                    decode_body(header.opcode, bytes, offset)?
                }
                None => {
                    diag::warn_at(offset, "unknown v1.1 opcode");
                    return Err(Error::BadType);
                }
            }
        };
        actlist.push(entry);
        offset += header.len;
    }
    Ok(())
}

/// Parse a v1.1 instruction envelope of declared `instructions_len`
/// bytes, writing the framed `APPLY_ACTIONS` payload (if any) into
/// `actlist`. On error, `actlist` is cleared.
pub fn parse_instructions(bytes: &[u8], instructions_len: usize, actlist: &mut Actlist) -> Result<()> {
    match parse_instructions_inner(bytes, instructions_len, actlist) {
        Ok(()) => Ok(()),
        Err(e) => {
            actlist.clear();
            Err(e)
        }
    }
}

fn parse_instructions_inner(
    bytes: &[u8],
    instructions_len: usize,
    actlist: &mut Actlist,
) -> Result<()> {
    if instructions_len % ALIGN != 0 || instructions_len > bytes.len() {
        return Err(Error::BadRequestLen);
    }

    let mut apply_actions: Option<(usize, usize)> = None;
    let mut saw_other = false;
    let mut seen_kinds: Vec<u16> = Vec::new();

    let mut offset = 0;
    while offset < instructions_len {
        let remaining = instructions_len - offset;
        if remaining < 8 {
            diag::warn_at(offset, "instruction header truncated");
            return Err(Error::BadLen);
        }
        let kind = BigEndian::read_u16(&bytes[offset..offset + 2]);
        let len = BigEndian::read_u16(&bytes[offset + 2..offset + 4]) as usize;
        if len == 0 || len % ALIGN != 0 || len < 8 || len > remaining {
            diag::warn_at(offset, "bad instruction length");
            return Err(Error::BadLen);
        }

        match kind {
            GOTO_TABLE | WRITE_METADATA | WRITE_ACTIONS | CLEAR_ACTIONS => {
                if seen_kinds.contains(&kind) {
                    diag::warn_at(offset, "duplicate instruction kind");
                    return Err(Error::DupType);
                }
                seen_kinds.push(kind);
                saw_other = true;
            }
            APPLY_ACTIONS => {
                if seen_kinds.contains(&APPLY_ACTIONS) {
                    diag::warn_at(offset, "duplicate APPLY_ACTIONS");
                    return Err(Error::DupType);
                }
                seen_kinds.push(APPLY_ACTIONS);
                apply_actions = Some((offset + 8, len - 8));
            }
            EXPERIMENTER_INST => {
                diag::warn_at(offset, "experimenter instruction");
                return Err(Error::BadExperimenter);
            }
            _ => {
                diag::warn_at(offset, "unknown instruction kind");
                return Err(Error::UnknownInst);
            }
        }
        offset += len;
    }

    if let Some((body_offset, body_len)) = apply_actions {
        parse_actions(&bytes[body_offset..body_offset + body_len], body_len, actlist)?;
    }
    if saw_other {
        return Err(Error::UnsupInst);
    }
    actlist.push_end();
    Ok(())
}

fn push_header(out: &mut Vec<u8>, opcode: u16, len: u16) {
    let mut hdr = [0u8; 4];
    BigEndian::write_u16(&mut hdr[0..2], opcode);
    BigEndian::write_u16(&mut hdr[2..4], len);
    out.extend_from_slice(&hdr);
}

fn emit_entry(entry: &Entry, out: &mut Vec<u8>) {
    match entry {
        Entry::Output { port: p, max_len } => {
            push_header(out, OUTPUT, 16);
            let mut body = [0u8; 12];
            BigEndian::write_u32(&mut body[0..4], port::remap_port_to_v11(*p));
            BigEndian::write_u16(&mut body[4..6], *max_len);
            out.extend_from_slice(&body);
        }
        Entry::SetVlanVid { vlan_vid } => {
            push_header(out, SET_VLAN_VID, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u16(&mut body[0..2], *vlan_vid);
            out.extend_from_slice(&body);
        }
        Entry::SetVlanPcp { vlan_pcp } => {
            push_header(out, SET_VLAN_PCP, 8);
            out.extend_from_slice(&[*vlan_pcp, 0, 0, 0]);
        }
        Entry::SetEthSrc { mac } => {
            push_header(out, SET_DL_SRC, 16);
            out.extend_from_slice(mac);
            out.extend_from_slice(&[0; 6]);
        }
        Entry::SetEthDst { mac } => {
            push_header(out, SET_DL_DST, 16);
            out.extend_from_slice(mac);
            out.extend_from_slice(&[0; 6]);
        }
        Entry::SetIpv4Src { ipv4 } => {
            push_header(out, SET_NW_SRC, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u32(&mut body, *ipv4);
            out.extend_from_slice(&body);
        }
        Entry::SetIpv4Dst { ipv4 } => {
            push_header(out, SET_NW_DST, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u32(&mut body, *ipv4);
            out.extend_from_slice(&body);
        }
        Entry::SetIpv4Dscp { dscp } => {
            push_header(out, SET_NW_TOS, 8);
            out.extend_from_slice(&[*dscp, 0, 0, 0]);
        }
        Entry::SetL4SrcPort { port } => {
            push_header(out, SET_TP_SRC, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u16(&mut body[0..2], *port);
            out.extend_from_slice(&body);
        }
        Entry::SetL4DstPort { port } => {
            push_header(out, SET_TP_DST, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u16(&mut body[0..2], *port);
            out.extend_from_slice(&body);
        }
        // No v1.1 opcode exists for ENQUEUE or STRIP_VLAN; they are
        // silently dropped rather than falling back to NX, matching the
        // preserved source behavior.
        Entry::Enqueue { .. } | Entry::StripVlan => {}
        _ => {
            if !nx::emit(entry, out) {
                diag::warn_at(out.len(), "entry has no v1.1 or NX encoding");
            }
        }
    }
}

/// Append `actlist` to `bytes` wrapped in a single `instruction_type`
/// instruction (normally `APPLY_ACTIONS`).
pub fn emit(actlist: &Actlist, instruction_type: u16, bytes: &mut Vec<u8>) {
    let start = bytes.len();
    push_header(bytes, instruction_type, 0);
    bytes.extend_from_slice(&[0, 0, 0, 0]); // pad/reserved word of the instruction header
    for entry in actlist.entries() {
        emit_entry(entry, bytes);
    }
    let unpadded = bytes.len() - start;
    bytes.resize(bytes.len() + pad_len(unpadded), 0);
    let total_len = (bytes.len() - start) as u16;
    BigEndian::write_u16(&mut bytes[start + 2..start + 4], total_len);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_apply_actions_output_parses() {
        let mut actions = Vec::new();
        actions.extend_from_slice(&[0, 0, 0, 16]); // OUTPUT, len 16
        actions.extend_from_slice(&[0, 0, 0, 1]); // port 1
        actions.extend_from_slice(&[0, 0, 0, 0]); // max_len 0, pad(2)
        actions.extend_from_slice(&[0, 0, 0, 0]); // pad(4)

        let mut msg = Vec::new();
        msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, (8 + actions.len()) as u8]);
        msg.extend_from_slice(&[0, 0, 0, 0]);
        msg.extend_from_slice(&actions);

        let mut actlist = Actlist::new();
        parse_instructions(&msg, msg.len(), &mut actlist).unwrap();
        let entries: Vec<_> = actlist.entries().cloned().collect();
        assert_eq!(entries, vec![Entry::Output { port: 1, max_len: 0 }]);
    }

    #[test]
    fn s6_goto_table_alongside_apply_actions_is_unsupported() {
        let mut msg = Vec::new();
        // GOTO_TABLE, len 8
        msg.extend_from_slice(&[0, GOTO_TABLE as u8, 0, 8]);
        msg.extend_from_slice(&[0, 0, 0, 0]);
        // APPLY_ACTIONS, len 8 (empty)
        msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, 8]);
        msg.extend_from_slice(&[0, 0, 0, 0]);

        let mut actlist = Actlist::new();
        assert_eq!(parse_instructions(&msg, msg.len(), &mut actlist), Err(Error::UnsupInst));
        assert!(actlist.iter().next().is_none());
    }

    #[test]
    fn duplicate_apply_actions_is_dup_type() {
        let mut msg = Vec::new();
        msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, 8]);
        msg.extend_from_slice(&[0, 0, 0, 0]);
        msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, 8]);
        msg.extend_from_slice(&[0, 0, 0, 0]);

        let mut actlist = Actlist::new();
        assert_eq!(parse_instructions(&msg, msg.len(), &mut actlist), Err(Error::DupType));
    }

    #[test]
    fn round_trips_output_through_apply_actions() {
        let mut actlist = Actlist::new();
        actlist.push(Entry::Output { port: 7, max_len: 0 });
        actlist.push_end();
        let mut bytes = Vec::new();
        emit(&actlist, APPLY_ACTIONS, &mut bytes);

        let mut parsed = Actlist::new();
        parse_instructions(&bytes, bytes.len(), &mut parsed).unwrap();
        assert_eq!(parsed, actlist);
    }

    #[test]
    fn enqueue_and_strip_vlan_are_dropped_on_v11_emit() {
        let mut actlist = Actlist::new();
        actlist.push(Entry::Enqueue { port: 1, queue: 0 });
        actlist.push(Entry::StripVlan);
        actlist.push_end();
        let mut bytes = Vec::new();
        emit(&actlist, APPLY_ACTIONS, &mut bytes);
        assert_eq!(bytes.len(), 8); // just the instruction header, no body
    }
}
