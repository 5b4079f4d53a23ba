//! Canonical human-readable rendering of an actlist.

use smoltcp::wire::{EthernetAddress, Ipv4Address};

use crate::collab::{field_registry, port, subcodec};
use crate::model::{Actlist, CompatTag, Entry};

/// `OFPR_ACTION`: the default controller reason, used to pick the short
/// `CONTROLLER:<max_len>` spelling.
const REASON_ACTION: u8 = 1;

fn push_mac(text: &mut String, mac: &[u8; 6]) {
    text.push_str(&EthernetAddress::from_bytes(mac).to_string());
}

fn push_ipv4(text: &mut String, ipv4: u32) {
    text.push_str(&Ipv4Address::from_bytes(&ipv4.to_be_bytes()[..]).to_string());
}

fn format_entry(entry: &Entry, text: &mut String) {
    match entry {
        Entry::Output { port: p, .. } => {
            text.push_str("output:");
            port::format_port(*p, text);
        }
        Entry::Controller { max_len, controller_id, reason } => {
            if *reason == REASON_ACTION && *controller_id == 0 {
                text.push_str(&format!("CONTROLLER:{}", max_len));
            } else {
                text.push_str(&format!(
                    "controller(reason={},max_len={},id={})",
                    reason, max_len, controller_id
                ));
            }
        }
        Entry::Enqueue { port: p, queue } => {
            text.push_str("enqueue:");
            port::format_port(*p, text);
            text.push('q');
            text.push_str(&queue.to_string());
        }
        Entry::OutputReg { src, max_len } => {
            text.push_str("output_reg(");
            field_registry::format_subfield(src, text);
            text.push_str(&format!(",max_len={})", max_len));
        }
        Entry::Bundle(opaque) => subcodec::format("bundle", opaque, text),
        Entry::SetVlanVid { vlan_vid } => text.push_str(&format!("mod_vlan_vid:{}", vlan_vid)),
        Entry::SetVlanPcp { vlan_pcp } => text.push_str(&format!("mod_vlan_pcp:{}", vlan_pcp)),
        Entry::StripVlan => text.push_str("strip_vlan"),
        Entry::SetEthSrc { mac } => {
            text.push_str("mod_dl_src:");
            push_mac(text, mac);
        }
        Entry::SetEthDst { mac } => {
            text.push_str("mod_dl_dst:");
            push_mac(text, mac);
        }
        Entry::SetIpv4Src { ipv4 } => {
            text.push_str("mod_nw_src:");
            push_ipv4(text, *ipv4);
        }
        Entry::SetIpv4Dst { ipv4 } => {
            text.push_str("mod_nw_dst:");
            push_ipv4(text, *ipv4);
        }
        Entry::SetIpv4Dscp { dscp } => text.push_str(&format!("mod_nw_tos:{}", dscp)),
        Entry::SetL4SrcPort { port: p } => text.push_str(&format!("mod_tp_src:{}", p)),
        Entry::SetL4DstPort { port: p } => text.push_str(&format!("mod_tp_dst:{}", p)),
        Entry::RegMove(opaque) => subcodec::format("reg_move", opaque, text),
        Entry::RegLoad(opaque) => subcodec::format("reg_load", opaque, text),
        Entry::DecTtl => text.push_str("dec_ttl"),
        Entry::SetTunnel { tun_id, compat_hint } => {
            let wide = *tun_id > u64::from(u32::MAX) || *compat_hint == CompatTag::NxSetTunnel64;
            if wide {
                text.push_str(&format!("set_tunnel64:{:#x}", tun_id));
            } else {
                text.push_str(&format!("set_tunnel:{:#x}", tun_id));
            }
        }
        Entry::SetQueue { queue_id } => text.push_str(&format!("set_queue:{}", queue_id)),
        Entry::PopQueue => text.push_str("pop_queue"),
        Entry::FinTimeout { idle, hard } => {
            let mut fields = Vec::new();
            if *idle != 0 {
                fields.push(format!("idle_timeout={}", idle));
            }
            if *hard != 0 {
                fields.push(format!("hard_timeout={}", hard));
            }
            text.push_str(&format!("fin_timeout({})", fields.join(",")));
        }
        Entry::Resubmit { in_port, table_id, .. } => {
            if *table_id == 0xff {
                text.push_str("resubmit:");
                port::format_port(*in_port, text);
            } else {
                text.push_str("resubmit(");
                port::format_port(*in_port, text);
                text.push(',');
                text.push_str(&table_id.to_string());
                text.push(')');
            }
        }
        Entry::Learn(opaque) => subcodec::format("learn", opaque, text),
        Entry::Multipath(opaque) => subcodec::format("multipath", opaque, text),
        Entry::Autopath { port: p, dst } => {
            text.push_str("autopath(");
            text.push_str(&p.to_string());
            text.push(',');
            field_registry::format_subfield(dst, text);
            text.push(')');
        }
        Entry::Note { bytes } => {
            text.push_str("note:");
            let rendered: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            text.push_str(&rendered.join("."));
        }
        Entry::Exit => text.push_str("exit"),
        Entry::End => {}
    }
}

/// Render `actlist` as a single `actions=<entry>,<entry>,…` line. An
/// empty actlist renders as `actions=drop`.
pub fn format(actlist: &Actlist, text: &mut String) {
    text.push_str("actions=");
    if actlist.is_empty() {
        text.push_str("drop");
        return;
    }
    let rendered: Vec<String> = actlist
        .entries()
        .map(|entry| {
            let mut s = String::new();
            format_entry(entry, &mut s);
            s
        })
        .collect();
    text.push_str(&rendered.join(","));
}
