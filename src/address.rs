//! Host-order socket addressing and the textual config parser.
//!
//! Network byte order conversion is confined to `medium.rs`; everything in
//! this module and above deals in host-order `u32`/`u16`.

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{RadioError, Result};

/// An IPv4 address + port pair, host byte order.
///
/// Mirrors `virtualLinkSocketAddress` from the original source one field at
/// a time: `ipv4_address` -> `ipv4`, `port` -> `port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddress {
    pub ipv4: u32,
    pub port: u16,
}

impl SocketAddress {
    pub const fn new(ipv4: u32, port: u16) -> Self {
        Self { ipv4, port }
    }

    /// Parse `"a.b.c.d:port"`. Fails unless both the address and the port
    /// fully consume their substrings — a trailing garbage character after
    /// either one is a parse failure, matching `socketAddressFromString`'s
    /// `strtol` re-check (`*port_string_last_char != '\0'`).
    pub fn from_str_parts(s: &str) -> Result<Self> {
        let (ip_part, port_part) = s
            .split_once(':')
            .ok_or_else(|| RadioError::AddressFormat(s.to_owned()))?;

        let ipv4 = Ipv4Addr::from_str(ip_part)?;
        let port = u16::from_str(port_part)
            .map_err(|_| RadioError::AddressFormat(s.to_owned()))?;

        Ok(Self {
            ipv4: u32::from(ipv4),
            port,
        })
    }

    pub fn to_ipv4_addr(self) -> Ipv4Addr {
        Ipv4Addr::from(self.ipv4)
    }
}

/// Parsed, host-order configuration for a [`crate::medium::MediumEndpoint`].
///
/// `rx_addr.ipv4` is the multicast group every peer joins; `interface_ipv4`
/// selects which local interface originates the join and the outgoing
/// multicast traffic; `tx_addr` is this endpoint's own identity, used only
/// for self-echo suppression on receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediumConfig {
    pub tx_addr: SocketAddress,
    pub rx_addr: SocketAddress,
    pub interface_ipv4: u32,
    pub rx_buffer_capacity: usize,
}

impl MediumConfig {
    /// Parse the three textual endpoints in `iface`/`tx`/`rx` form.
    /// Mirrors `virtualLink_configFromStrings`.
    pub fn from_strings(iface: &str, tx: &str, rx: &str, rx_buffer_capacity: usize) -> Result<Self> {
        let interface_ipv4 = u32::from(Ipv4Addr::from_str(iface)?);
        let tx_addr = SocketAddress::from_str_parts(tx)?;
        let rx_addr = SocketAddress::from_str_parts(rx)?;

        Ok(Self {
            tx_addr,
            rx_addr,
            interface_ipv4,
            rx_buffer_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_address() {
        let addr = SocketAddress::from_str_parts("224.0.0.116:9000").unwrap();
        assert_eq!(addr.port, 9000);
        assert_eq!(addr.to_ipv4_addr(), Ipv4Addr::new(224, 0, 0, 116));
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(SocketAddress::from_str_parts("127.0.0.1").is_err());
    }

    #[test]
    fn rejects_trailing_garbage_in_port() {
        assert!(SocketAddress::from_str_parts("127.0.0.1:9000x").is_err());
    }

    #[test]
    fn rejects_malformed_ipv4() {
        assert!(SocketAddress::from_str_parts("999.0.0.1:9000").is_err());
    }

    #[test]
    fn config_from_strings_round_trips() {
        let config = MediumConfig::from_strings(
            "127.0.0.1",
            "127.0.0.1:9000",
            "224.0.0.116:9000",
            256,
        )
        .unwrap();
        assert_eq!(config.tx_addr.port, 9000);
        assert_eq!(config.rx_addr.ipv4, u32::from(Ipv4Addr::new(224, 0, 0, 116)));
    }
}
