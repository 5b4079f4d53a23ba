//! OpenFlow v1.0 action dialect: opcode table, parser, and emitter.

use byteorder::{BigEndian, ByteOrder};

use super::{decode_header, check_size, nx};
use crate::collab::port;
use crate::diag;
use crate::error::{Error, Result};
use crate::model::{Actlist, Entry};
use crate::wire::ALIGN;

pub const OUTPUT: u16 = 0;
pub const SET_VLAN_VID: u16 = 1;
pub const SET_VLAN_PCP: u16 = 2;
pub const STRIP_VLAN: u16 = 3;
pub const SET_DL_SRC: u16 = 4;
pub const SET_DL_DST: u16 = 5;
pub const SET_NW_SRC: u16 = 6;
pub const SET_NW_DST: u16 = 7;
pub const SET_NW_TOS: u16 = 8;
pub const SET_TP_SRC: u16 = 9;
pub const SET_TP_DST: u16 = 10;
pub const ENQUEUE: u16 = 11;
pub const VENDOR: u16 = nx::VENDOR_ESCAPE;

const DSCP_MASK: u8 = 0xfc;

fn opcode_size(opcode: u16) -> Option<(usize, bool)> {
    match opcode {
        OUTPUT => Some((8, false)),
        SET_VLAN_VID => Some((8, false)),
        SET_VLAN_PCP => Some((8, false)),
        STRIP_VLAN => Some((8, false)),
        SET_DL_SRC | SET_DL_DST => Some((16, false)),
        SET_NW_SRC | SET_NW_DST => Some((8, false)),
        SET_NW_TOS => Some((8, false)),
        SET_TP_SRC | SET_TP_DST => Some((8, false)),
        ENQUEUE => Some((16, false)),
        _ => None,
    }
}

fn mac_at(buf: &[u8], offset: usize) -> [u8; 6] {
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&buf[offset..offset + 6]);
    mac
}

/// Decode one v1.0 action body into an [`Entry`].
fn decode_body(opcode: u16, buf: &[u8], offset: usize) -> Result<Entry> {
    Ok(match opcode {
        OUTPUT => {
            let raw_port = BigEndian::read_u16(&buf[offset + 4..offset + 6]);
            let max_len = BigEndian::read_u16(&buf[offset + 6..offset + 8]);
            port::check_output_port(raw_port, port::MAX_PHYS_PORT)?;
            Entry::Output { port: raw_port, max_len }
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
        STRIP_VLAN => Entry::StripVlan,
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
        ENQUEUE => {
            let raw_port = BigEndian::read_u16(&buf[offset + 4..offset + 6]);
            let queue = BigEndian::read_u32(&buf[offset + 12..offset + 16]);
            port::check_enqueue_port(raw_port, port::MAX_PHYS_PORT)?;
            Entry::Enqueue { port: raw_port, queue }
        }
        _ => unreachable!("opcode_size already rejected unknown opcodes"),
    })
}

/// Parse `actions_len` bytes of v1.0 actions from `bytes` into `actlist`.
/// On any error, `actlist` is cleared before the error is returned.
pub fn parse(bytes: &[u8], actions_len: usize, actlist: &mut Actlist) -> Result<()> {
    match parse_inner(bytes, actions_len, actlist) {
        Ok(()) => Ok(()),
        Err(e) => {
            actlist.clear();
            Err(e)
        }
    }
}

fn parse_inner(bytes: &[u8], actions_len: usize, actlist: &mut Actlist) -> Result<()> {
    if actions_len % ALIGN != 0 || actions_len > bytes.len() {
        return Err(Error::BadRequestLen);
    }
    let mut offset = 0;
    while offset < actions_len {
        let remaining = actions_len - offset;
        let header = decode_header(bytes, offset, remaining)?;
        let entry = if header.opcode == VENDOR {
            let subtype = nx::decode_vendor(bytes, offset, header.len)?;
            nx::decode_body(subtype, bytes, offset, header.len)?
        } else {
            match opcode_size(header.opcode) {
                Some((struct_size, extensible)) => {
                    check_size(header.len, struct_size, extensible, offset)?;
                    decode_body(header.opcode, bytes, offset)?
                }
                None => {
                    diag::warn_at(offset, "unknown v1.0 opcode");
                    return Err(Error::BadType);
                }
            }
        };
        actlist.push(entry);
        offset += header.len;
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
        Entry::Output { port, max_len } => {
            push_header(out, OUTPUT, 8);
            let mut body = [0u8; 4];
            BigEndian::write_u16(&mut body[0..2], *port);
            BigEndian::write_u16(&mut body[2..4], *max_len);
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
        Entry::StripVlan => {
            push_header(out, STRIP_VLAN, 8);
            out.extend_from_slice(&[0; 4]);
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
        Entry::Enqueue { port, queue } => {
            push_header(out, ENQUEUE, 16);
            let mut body = [0u8; 12];
            BigEndian::write_u16(&mut body[0..2], *port);
            BigEndian::write_u32(&mut body[8..12], *queue);
            out.extend_from_slice(&body);
        }
        _ => {
            // No v1.0-native opcode; fall back to the NX vendor encoding.
            if !nx::emit(entry, out) {
                diag::warn_at(out.len(), "entry has no v1.0 or NX encoding");
            }
        }
    }
}

/// Append `actlist`'s v1.0 wire encoding to `bytes`.
pub fn emit(actlist: &Actlist, bytes: &mut Vec<u8>) {
    for entry in actlist.entries() {
        emit_entry(entry, bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_output_round_trips() {
        let input = [0x00, 0x00, 0x00, 0x08, 0x00, 0x02, 0x00, 0x00];
        let mut actlist = Actlist::new();
        parse(&input, input.len(), &mut actlist).unwrap();
        let entries: Vec<_> = actlist.entries().cloned().collect();
        assert_eq!(entries, vec![Entry::Output { port: 2, max_len: 0 }]);

        let mut out = Vec::new();
        emit(&actlist, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn s2_bad_vlan_vid_bit_rejected() {
        let input = [0x00, 0x01, 0x00, 0x08, 0x10, 0x00, 0x00, 0x00];
        let mut actlist = Actlist::new();
        assert_eq!(parse(&input, input.len(), &mut actlist), Err(Error::BadArgument));
        assert!(actlist.iter().next().is_none());
    }

    #[test]
    fn misaligned_actions_len_is_bad_request_len() {
        let input = [0u8; 9];
        let mut actlist = Actlist::new();
        assert_eq!(parse(&input, 9, &mut actlist), Err(Error::BadRequestLen));
    }

    #[test]
    fn unrepresentable_entry_falls_back_to_nx() {
        let mut actlist = Actlist::new();
        actlist.push(Entry::DecTtl);
        actlist.push_end();
        let mut out = Vec::new();
        emit(&actlist, &mut out);
        assert_eq!(BigEndian::read_u16(&out[0..2]), VENDOR);
    }
}
