//! The protocol-neutral action-list representation ("actlist").
//!
//! Entries are stored in an ordinary `Vec`; the `A = 8` alignment the wire
//! forms require is an emission-time concern (see [`crate::action`]), not
//! part of the in-memory shape.

/// A reference to a match field in the surrounding flow model, identified
/// by its NXM header. Out of scope: the field's own semantics. This crate
/// treats it as an opaque, equality-comparable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRef {
    /// The field's NXM header, as returned by
    /// [`crate::collab::field_registry::field_from_nxm_header`].
    pub field_id: u32,
    /// Bit offset of the referenced subfield within the field.
    pub offset: u16,
    /// Width in bits of the referenced subfield.
    pub n_bits: u16,
}

/// Records which wire opcode an entry that has more than one equivalent
/// NX encoding was originally parsed from, so a later emitter reproduces
/// the same bytes instead of silently normalizing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatTag {
    /// No compatibility hint; default emission rules apply.
    None,
    /// Parsed from `NXAST_RESUBMIT`.
    NxResubmit,
    /// Parsed from `NXAST_RESUBMIT_TABLE`.
    NxResubmitTable,
    /// Parsed from `NXAST_SET_TUNNEL`.
    NxSetTunnel,
    /// Parsed from `NXAST_SET_TUNNEL64`.
    NxSetTunnel64,
}

impl Default for CompatTag {
    fn default() -> Self {
        CompatTag::None
    }
}

/// The undecoded body of a sub-codec entry (`bundle`, `learn`,
/// `multipath`, `reg_move`, `reg_load`) whose semantics are out of scope
/// for this crate. `head` is everything in the action body after the
/// common NX vendor header (type/len/vendor/subtype), i.e. exactly the
/// bytes the owning sub-codec would need to finish decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub head: Vec<u8>,
}

/// One entry in an actlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Output { port: u16, max_len: u16 },
    Controller { max_len: u16, controller_id: u16, reason: u8 },
    Enqueue { port: u16, queue: u32 },
    OutputReg { src: FieldRef, max_len: u16 },
    Bundle(Opaque),
    SetVlanVid { vlan_vid: u16 },
    SetVlanPcp { vlan_pcp: u8 },
    StripVlan,
    SetEthSrc { mac: [u8; 6] },
    SetEthDst { mac: [u8; 6] },
    SetIpv4Src { ipv4: u32 },
    SetIpv4Dst { ipv4: u32 },
    SetIpv4Dscp { dscp: u8 },
    SetL4SrcPort { port: u16 },
    SetL4DstPort { port: u16 },
    RegMove(Opaque),
    RegLoad(Opaque),
    DecTtl,
    SetTunnel { tun_id: u64, compat_hint: CompatTag },
    SetQueue { queue_id: u32 },
    PopQueue,
    FinTimeout { idle: u16, hard: u16 },
    Resubmit { in_port: u16, table_id: u8, compat_hint: CompatTag },
    Learn(Opaque),
    Multipath(Opaque),
    Autopath { port: u32, dst: FieldRef },
    Note { bytes: Vec<u8> },
    Exit,
    /// Sentinel: valid only as the last element of an [`Actlist`].
    End,
}

/// An ordered sequence of [`Entry`] values terminated by a single
/// [`Entry::End`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Actlist {
    entries: Vec<Entry>,
}

impl Actlist {
    /// Create an empty actlist (not yet terminated with `END`).
    pub fn new() -> Self {
        Actlist { entries: Vec::new() }
    }

    /// Append an entry. Panics if called after [`Actlist::push_end`]: an
    /// internal invariant violation, not a wire-format error, so this is a
    /// programmer error rather than a `Result`.
    pub fn push(&mut self, entry: Entry) {
        debug_assert!(
            self.entries.last() != Some(&Entry::End),
            "cannot append to an actlist after its END sentinel"
        );
        self.entries.push(entry);
    }

    /// Append the `END` sentinel, capping the actlist.
    pub fn push_end(&mut self) {
        self.entries.push(Entry::End);
    }

    /// Drop all entries, as required on parse failure.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate all entries, including the trailing `END` sentinel if
    /// present.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Iterate only the entries before `END` (read-only iteration that
    /// stops at the sentinel without yielding it).
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().take_while(|e| **e != Entry::End)
    }

    /// True if this actlist is empty (i.e. its first entry, if any, is
    /// `END`).
    pub fn is_empty(&self) -> bool {
        self.entries.first() == Some(&Entry::End) || self.entries.is_empty()
    }

    /// True if the actlist is capped with an `END` sentinel.
    pub fn has_end(&self) -> bool {
        self.entries.last() == Some(&Entry::End)
    }
}

impl<'a> IntoIterator for &'a Actlist {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
