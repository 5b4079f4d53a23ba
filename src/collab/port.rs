//! Reserved-port handling: the narrow "port remap" collaborator. Grounded
//! on `port.rs` in the teacher crate (the `PortNumber`/`From<u32>`
//! pattern), generalized to the v1.0 16-bit encoding this codec targets
//! plus the v1.1 32-bit encoding it must translate on the way in.

use crate::error::{Error, Result};

/// Maximum number of physical and logical switch ports (`OFPP_MAX`).
pub const MAX_PHYS_PORT: u16 = 0xff00;
/// Send the packet out the input port.
pub const IN_PORT: u16 = 0xfff8;
/// Submit the packet to the first flow table.
pub const TABLE: u16 = 0xfff9;
/// Forward using non-OpenFlow pipeline.
pub const NORMAL: u16 = 0xfffa;
/// Flood using non-OpenFlow pipeline.
pub const FLOOD: u16 = 0xfffb;
/// Flood through all standard ports except the input port.
pub const ALL: u16 = 0xfffc;
/// Send to the controller.
pub const CONTROLLER: u16 = 0xfffd;
/// Local OpenFlow "port".
pub const LOCAL: u16 = 0xfffe;
/// Wildcarded / not specified.
pub const NONE: u16 = 0xffff;

fn format_reserved(port: u16) -> Option<&'static str> {
    match port {
        IN_PORT => Some("IN_PORT"),
        TABLE => Some("TABLE"),
        NORMAL => Some("NORMAL"),
        FLOOD => Some("FLOOD"),
        ALL => Some("ALL"),
        CONTROLLER => Some("CONTROLLER"),
        LOCAL => Some("LOCAL"),
        NONE => Some("NONE"),
        _ => None,
    }
}

/// Broad output-port policy shared by `OUTPUT` at parse time (bound =
/// [`MAX_PHYS_PORT`]) and at semantic-check time (bound = the caller's
/// `max_ports`). Any reserved port is always accepted; a regular port
/// must be strictly below `bound`.
pub fn check_output_port(port: u16, bound: u16) -> Result<()> {
    if format_reserved(port).is_some() {
        Ok(())
    } else if port < bound {
        Ok(())
    } else {
        Err(Error::BadOutPort)
    }
}

/// Narrower policy for `ENQUEUE`: only `IN_PORT` and `LOCAL` are accepted
/// as reserved values, matching `enqueue_from_openflow10`'s inline check.
pub fn check_enqueue_port(port: u16, bound: u16) -> Result<()> {
    if port == IN_PORT || port == LOCAL {
        Ok(())
    } else if port < bound {
        Ok(())
    } else {
        Err(Error::BadOutPort)
    }
}

/// Translate a v1.1 32-bit port value to its v1.0 16-bit equivalent.
/// Reserved v1.1 ports share their low 16 bits with the v1.0 encoding;
/// non-reserved ports must already fit in 16 bits.
pub fn remap_port_from_v11(port: u32) -> Result<u16> {
    if port >= 0xffff_ff00 {
        Ok((port & 0xffff) as u16)
    } else if port <= 0xfeff {
        Ok(port as u16)
    } else {
        Err(Error::BadOutPort)
    }
}

/// Translate a v1.0 16-bit port value to its v1.1 32-bit equivalent.
pub fn remap_port_to_v11(port: u16) -> u32 {
    if port >= MAX_PHYS_PORT {
        0xffff_0000 | u32::from(port)
    } else {
        u32::from(port)
    }
}

/// Append the canonical textual spelling of `port` to `text`.
pub fn format_port(port: u16, text: &mut String) {
    match format_reserved(port) {
        Some(name) => text.push_str(name),
        None => text.push_str(&port.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_ports_always_pass_output_check() {
        assert!(check_output_port(CONTROLLER, 4).is_ok());
        assert!(check_output_port(LOCAL, 0).is_ok());
    }

    #[test]
    fn regular_port_must_be_below_bound() {
        assert!(check_output_port(3, 4).is_ok());
        assert!(check_output_port(4, 4).is_err());
    }

    #[test]
    fn enqueue_only_allows_in_port_and_local() {
        assert!(check_enqueue_port(IN_PORT, 4).is_ok());
        assert!(check_enqueue_port(LOCAL, 4).is_ok());
        assert!(check_enqueue_port(CONTROLLER, 4).is_err());
        assert!(check_enqueue_port(2, 4).is_ok());
    }

    #[test]
    fn v11_remap_round_trips_reserved_and_regular() {
        assert_eq!(remap_port_from_v11(0xffff_fffe).unwrap(), LOCAL);
        assert_eq!(remap_port_to_v11(LOCAL), 0xffff_fffe);
        assert_eq!(remap_port_from_v11(42).unwrap(), 42);
        assert_eq!(remap_port_to_v11(42), 42);
    }

    #[test]
    fn v11_remap_rejects_out_of_range_regular_port() {
        assert!(remap_port_from_v11(0x1_0000).is_err());
    }
}
