//! Semantic checker: validates entries against a packet-classifier
//! context and a port-count bound.

use crate::collab::{field_registry, port, subcodec};
use crate::error::Result;
use crate::model::{Actlist, Entry};

/// Check one entry against `flow` and `max_ports`. All variants not
/// explicitly listed here succeed unconditionally.
pub fn check(entry: &Entry, flow: Option<&field_registry::FlowCtx>, max_ports: u16) -> Result<()> {
    match entry {
        Entry::Output { port: p, .. } => port::check_output_port(*p, max_ports),
        Entry::Enqueue { port: p, .. } => port::check_enqueue_port(*p, max_ports),
        Entry::OutputReg { src, .. } => field_registry::check_src(src, flow),
        Entry::Autopath { dst, .. } => field_registry::check_src(dst, flow),
        Entry::Bundle(opaque)
        | Entry::Learn(opaque)
        | Entry::Multipath(opaque)
        | Entry::RegMove(opaque)
        | Entry::RegLoad(opaque) => subcodec::check(opaque),
        _ => Ok(()),
    }
}

/// Check every entry in `actlist`, returning on the first error.
pub fn check_list(
    actlist: &Actlist,
    flow: Option<&field_registry::FlowCtx>,
    max_ports: u16,
) -> Result<()> {
    for entry in actlist.entries() {
        check(entry, flow, max_ports)?;
    }
    Ok(())
}
