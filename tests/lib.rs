//! End-to-end scenarios and round-trip laws.

use ofpact::{
    check_list, emit_v10, equal, format, parse_actions_v10, parse_instructions_v11, Actlist,
    CompatTag, Entry, Error,
};

const APPLY_ACTIONS: u16 = 4;
const GOTO_TABLE: u16 = 1;

#[test]
fn s1_v10_output_round_trips_byte_exact() {
    let input = [0x00, 0x00, 0x00, 0x08, 0x00, 0x02, 0x00, 0x00];
    let mut actlist = Actlist::new();
    parse_actions_v10(&input, input.len(), &mut actlist).unwrap();

    let entries: Vec<_> = actlist.entries().cloned().collect();
    assert_eq!(entries, vec![Entry::Output { port: 2, max_len: 0 }]);

    let mut out = Vec::new();
    emit_v10(&actlist, &mut out);
    assert_eq!(out, input);
}

#[test]
fn s2_v10_set_vlan_vid_bad_bit_is_bad_argument() {
    let input = [0x00, 0x01, 0x00, 0x08, 0x10, 0x00, 0x00, 0x00];
    let mut actlist = Actlist::new();
    let err = parse_actions_v10(&input, input.len(), &mut actlist).unwrap_err();
    assert_eq!(err, Error::BadArgument);
    assert!(actlist.iter().next().is_none());
}

#[test]
fn s3_nx_note_round_trips_and_formats() {
    let input = [
        0xff, 0xff, 0x00, 0x10, 0x00, 0x00, 0x23, 0x20, 0x00, 0x08, 0xaa, 0xbb, 0xcc, 0x00, 0x00,
        0x00,
    ];
    let mut actlist = Actlist::new();
    parse_actions_v10(&input, input.len(), &mut actlist).unwrap();

    // The declared length (16) minus the 10-byte common header leaves 6
    // bytes of note body, including the trailing alignment padding; note
    // decode does not (and cannot) distinguish padding from payload.
    let entries: Vec<_> = actlist.entries().cloned().collect();
    assert_eq!(
        entries,
        vec![Entry::Note { bytes: vec![0xaa, 0xbb, 0xcc, 0x00, 0x00, 0x00] }]
    );

    let mut text = String::new();
    format(&actlist, &mut text);
    assert_eq!(text, "actions=note:aa.bb.cc.00.00.00");
}

#[test]
fn s4_nx_resubmit_table_nonzero_pad_is_bad_argument() {
    let mut input = vec![0u8; 16];
    input[0] = 0xff;
    input[1] = 0xff;
    input[3] = 0x10;
    input[6] = 0x23;
    input[7] = 0x20;
    input[9] = 14; // NXAST_RESUBMIT_TABLE
    input[10] = 0x00;
    input[11] = 0x03; // in_port = 3
    input[12] = 5; // table_id = 5
    input[13] = 1; // pad byte, must be zero

    let mut actlist = Actlist::new();
    let err = parse_actions_v10(&input, input.len(), &mut actlist).unwrap_err();
    assert_eq!(err, Error::BadArgument);
}

#[test]
fn s5_v11_apply_actions_output_parses() {
    let mut actions = Vec::new();
    actions.extend_from_slice(&[0, 0, 0, 16]);
    actions.extend_from_slice(&[0, 0, 0, 1]);
    actions.extend_from_slice(&[0, 0, 0, 0]);
    actions.extend_from_slice(&[0, 0, 0, 0]);

    let mut msg = Vec::new();
    msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, (8 + actions.len()) as u8]);
    msg.extend_from_slice(&[0, 0, 0, 0]);
    msg.extend_from_slice(&actions);

    let mut actlist = Actlist::new();
    parse_instructions_v11(&msg, msg.len(), &mut actlist).unwrap();
    let entries: Vec<_> = actlist.entries().cloned().collect();
    assert_eq!(entries, vec![Entry::Output { port: 1, max_len: 0 }]);
}

#[test]
fn s6_v11_goto_table_with_apply_actions_is_unsup_inst() {
    let mut msg = Vec::new();
    msg.extend_from_slice(&[0, GOTO_TABLE as u8, 0, 8]);
    msg.extend_from_slice(&[0, 0, 0, 0]);
    msg.extend_from_slice(&[0, APPLY_ACTIONS as u8, 0, 8]);
    msg.extend_from_slice(&[0, 0, 0, 0]);

    let mut actlist = Actlist::new();
    let err = parse_instructions_v11(&msg, msg.len(), &mut actlist).unwrap_err();
    assert_eq!(err, Error::UnsupInst);
    assert!(actlist.iter().next().is_none());
}

#[test]
fn misaligned_actions_len_is_rejected() {
    let input = [0u8; 9];
    let mut actlist = Actlist::new();
    assert_eq!(parse_actions_v10(&input, 9, &mut actlist), Err(Error::BadRequestLen));
}

#[test]
fn truncated_prefix_never_yields_a_partial_actlist() {
    let full = {
        let mut actlist = Actlist::new();
        actlist.push(Entry::Output { port: 2, max_len: 0 });
        actlist.push(Entry::DecTtl);
        actlist.push_end();
        let mut bytes = Vec::new();
        emit_v10(&actlist, &mut bytes);
        bytes
    };

    for n in (0..full.len()).step_by(8) {
        if n == full.len() {
            continue;
        }
        let mut actlist = Actlist::new();
        let result = parse_actions_v10(&full[..n], n, &mut actlist);
        if result.is_err() {
            assert!(actlist.iter().next().is_none());
        }
    }
}

#[test]
fn tunnel_width_selection_matches_spec_examples() {
    let mut small = Actlist::new();
    small.push(Entry::SetTunnel { tun_id: 0xffff_ffff, compat_hint: CompatTag::None });
    small.push_end();
    let mut bytes = Vec::new();
    emit_v10(&small, &mut bytes);
    assert_eq!(&bytes[8..10], &[0x00, 0x02]); // NXAST_SET_TUNNEL

    let mut wide = Actlist::new();
    wide.push(Entry::SetTunnel { tun_id: 0x1_0000_0000, compat_hint: CompatTag::None });
    wide.push_end();
    let mut bytes = Vec::new();
    emit_v10(&wide, &mut bytes);
    assert_eq!(&bytes[8..10], &[0x00, 0x09]); // NXAST_SET_TUNNEL64

    let mut forced = Actlist::new();
    forced.push(Entry::SetTunnel { tun_id: 5, compat_hint: CompatTag::NxSetTunnel64 });
    forced.push_end();
    let mut bytes = Vec::new();
    emit_v10(&forced, &mut bytes);
    assert_eq!(&bytes[8..10], &[0x00, 0x09]);
}

#[test]
fn resubmit_variant_selection_matches_spec_examples() {
    let mut table_hint = Actlist::new();
    table_hint.push(Entry::Resubmit {
        in_port: 3,
        table_id: 0xff,
        compat_hint: CompatTag::NxResubmitTable,
    });
    table_hint.push_end();
    let mut bytes = Vec::new();
    emit_v10(&table_hint, &mut bytes);
    assert_eq!(&bytes[8..10], &[0x00, 14]); // NXAST_RESUBMIT_TABLE

    let mut plain = Actlist::new();
    plain.push(Entry::Resubmit { in_port: 3, table_id: 0xff, compat_hint: CompatTag::None });
    plain.push_end();
    let mut bytes = Vec::new();
    emit_v10(&plain, &mut bytes);
    assert_eq!(&bytes[8..10], &[0x00, 0x01]); // NXAST_RESUBMIT
}

#[test]
fn format_is_deterministic_across_a_round_trip() {
    let mut actlist = Actlist::new();
    actlist.push(Entry::Output { port: 2, max_len: 0 });
    actlist.push(Entry::DecTtl);
    actlist.push_end();

    let mut text_a = String::new();
    format(&actlist, &mut text_a);

    let mut bytes = Vec::new();
    emit_v10(&actlist, &mut bytes);
    let mut reparsed = Actlist::new();
    parse_actions_v10(&bytes, bytes.len(), &mut reparsed).unwrap();

    let mut text_b = String::new();
    format(&reparsed, &mut text_b);

    assert_eq!(text_a, text_b);
}

#[test]
fn equal_follows_byte_identity_not_compat_hint_identity() {
    let mut a = Actlist::new();
    a.push(Entry::Resubmit { in_port: 3, table_id: 0xff, compat_hint: CompatTag::None });
    a.push_end();

    let mut b = Actlist::new();
    b.push(Entry::Resubmit { in_port: 3, table_id: 0xff, compat_hint: CompatTag::NxResubmit });
    b.push_end();

    assert!(equal(&a, &b));
}

#[test]
fn check_list_rejects_out_of_range_output_port() {
    let mut actlist = Actlist::new();
    actlist.push(Entry::Output { port: 10, max_len: 0 });
    actlist.push_end();
    assert!(check_list(&actlist, None, 4).is_err());
    assert!(check_list(&actlist, None, 20).is_ok());
}
