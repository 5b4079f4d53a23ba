//! Field registry: the narrow interface this codec needs into the match
//! field namespace. The registry's own prerequisites and masking rules are
//! out of scope; this module only needs enough to identify a field by its
//! NXM header, sanity-check a `FieldRef`'s bit range, and render one for
//! [`crate::format`].

use crate::error::{Error, Result};
use crate::model::FieldRef;

/// Opaque handle for a match field, keyed on its raw NXM header. This
/// crate never interprets the field's contents; it only needs identity
/// (for equality/round-trip) and a name for formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldId(pub u32);

/// Placeholder for the surrounding packet-classifier context. The real
/// flow model lives outside this crate's scope; callers construct one
/// however their flow table does.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlowCtx;

/// A handful of well-known NXM/OXM headers, purely to make `format`
/// output recognizable; everything else falls back to its raw hex header.
fn known_name(header: u32) -> Option<&'static str> {
    match header {
        0x0000_0004 => Some("NXM_OF_IN_PORT"),
        0x0001_0004 => Some("NXM_NX_REG0"),
        0x0001_0104 => Some("NXM_NX_REG1"),
        0x0001_0204 => Some("NXM_NX_REG2"),
        0x0001_0304 => Some("NXM_NX_REG3"),
        0x0001_2008 => Some("NXM_NX_TUN_ID"),
        _ => None,
    }
}

/// Resolve a raw NXM header into a [`FieldId`]. This never fails: an
/// unrecognized header is still a valid opaque identity.
pub fn field_from_nxm_header(header: u32) -> FieldId {
    FieldId(header)
}

/// Sanity-check a field reference against the (possibly absent) flow
/// context. The field's actual prerequisites are out of scope; this only
/// rejects the one malformed shape this crate can detect on its own: a
/// zero-width subfield.
pub fn check_src(src: &FieldRef, _flow: Option<&FlowCtx>) -> Result<()> {
    if src.n_bits == 0 {
        Err(Error::BadArgument)
    } else {
        Ok(())
    }
}

/// Append the canonical textual spelling of a subfield reference to
/// `text`, e.g. `NXM_NX_REG0[0..16]`.
pub fn format_subfield(src: &FieldRef, text: &mut String) {
    match known_name(src.field_id) {
        Some(name) => text.push_str(name),
        None => text.push_str(&format!("{:#x}", src.field_id)),
    }
    text.push_str(&format!("[{}..{}]", src.offset, src.offset + src.n_bits));
}
