//! Error type for the action/instruction codec.
//!
//! These are the only errors the codec returns; nothing in this crate
//! panics on malformed wire input.

use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T> = ::core::result::Result<T, Error>;

/// An error encountered while decoding, encoding, or checking an actlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A declared length was inconsistent with the buffer or the opcode.
    #[error("bad action/instruction length")]
    BadLen,
    /// An opcode (or NX subtype) is unknown or explicitly obsolete.
    #[error("bad action/instruction type")]
    BadType,
    /// A vendor-escape action carried a vendor id other than the NX vendor id.
    #[error("bad vendor id")]
    BadVendor,
    /// A field value fell outside its allowed mask, or a reserved field was non-zero.
    #[error("bad action argument")]
    BadArgument,
    /// A port number was out of range for the given `max_ports`.
    #[error("bad output port")]
    BadOutPort,
    /// A v1.1 instruction kind was not recognized.
    #[error("unknown instruction type")]
    UnknownInst,
    /// A v1.1 instruction kind was recognized but is not implemented by this subsystem.
    #[error("unsupported instruction type")]
    UnsupInst,
    /// A v1.1 experimenter instruction was encountered.
    #[error("bad experimenter instruction")]
    BadExperimenter,
    /// Two instructions of the same kind were present in one instruction list.
    #[error("duplicate instruction type")]
    DupType,
    /// The outer `actions_len`/`instructions_len` field did not match the buffer.
    #[error("bad request length")]
    BadRequestLen,
}
