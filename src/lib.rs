//! A bidirectional codec between on-wire OpenFlow action/instruction byte
//! sequences (v1.0, v1.1, and the Nicira vendor extension family) and a
//! protocol-neutral in-memory action list ("actlist").
//!
//! This crate covers structural validation, semantic checks against a
//! packet-classifier context, canonical formatting, and equality, not
//! the flow table, packet pipeline, or socket I/O around it (see
//! [`collab`] for the narrow interfaces this codec expects from those).

pub mod action;
pub mod check;
pub mod collab;
pub mod diag;
pub mod error;
pub mod format;
pub mod model;
pub mod wire;

pub use error::{Error, Result};
pub use model::{Actlist, CompatTag, Entry, FieldRef, Opaque};

use collab::field_registry::FlowCtx;
use collab::port;

/// Parse `actions_len` bytes of v1.0 actions from `bytes` into `actlist`.
/// On error, `actlist` is cleared before the error is returned.
pub fn parse_actions_v10(bytes: &[u8], actions_len: usize, actlist: &mut Actlist) -> Result<()> {
    action::v10::parse(bytes, actions_len, actlist)
}

/// Parse a v1.1 instruction envelope of declared `instructions_len` bytes
/// into `actlist`.
pub fn parse_instructions_v11(
    bytes: &[u8],
    instructions_len: usize,
    actlist: &mut Actlist,
) -> Result<()> {
    action::v11::parse_instructions(bytes, instructions_len, actlist)
}

/// Append `actlist`'s v1.0 wire encoding to `bytes`.
pub fn emit_v10(actlist: &Actlist, bytes: &mut Vec<u8>) {
    action::v10::emit(actlist, bytes)
}

/// Append `actlist` to `bytes`, wrapped in a single `instruction_type`
/// v1.1 instruction.
pub fn emit_v11(actlist: &Actlist, instruction_type: u16, bytes: &mut Vec<u8>) {
    action::v11::emit(actlist, instruction_type, bytes)
}

/// Check every entry in `actlist` against `flow` and `max_ports`.
pub fn check_list(actlist: &Actlist, flow: Option<&FlowCtx>, max_ports: u16) -> Result<()> {
    check::check_list(actlist, flow, max_ports)
}

/// True iff `actlist` would direct a packet out `port`: a matching
/// `output`, a matching `enqueue`, or a `controller` entry when `port`
/// is [`collab::port::CONTROLLER`].
pub fn outputs_to_port(actlist: &Actlist, queried_port: u16) -> bool {
    actlist.entries().any(|entry| match entry {
        Entry::Output { port: p, .. } => *p == queried_port,
        Entry::Enqueue { port: p, .. } => *p == queried_port,
        Entry::Controller { .. } => queried_port == port::CONTROLLER,
        _ => false,
    })
}

/// Two actlists are equal iff their v1.0 serialized byte tails are
/// identical. The v1.0 encoding is used as the canonical byte form
/// since every entry either has a native v1.0 opcode or falls back to
/// an NX vendor action, and both dialects use the same NX encoding.
pub fn equal(a: &Actlist, b: &Actlist) -> bool {
    let mut a_bytes = Vec::new();
    let mut b_bytes = Vec::new();
    emit_v10(a, &mut a_bytes);
    emit_v10(b, &mut b_bytes);
    a_bytes == b_bytes
}

/// Render `actlist` as a single `actions=...` line.
pub fn format(actlist: &Actlist, text: &mut String) {
    format::format(actlist, text)
}
