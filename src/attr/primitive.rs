//! Primitive address and range codecs.
//!
//! These converters sit under the attribute codec: textual wire forms on
//! one side, fixed-width network-order binary on the other. The parsers
//! keep the leniency remote peers already rely on: a MAC is rejected only
//! when it does not contain exactly twelve hex digits, and malformed
//! IPv4/IPv6 input produces a numeric result (logged) rather than an
//! error. Well-formed input round-trips exactly.
use std::net::{Ipv4Addr, Ipv6Addr};

use log::warn;

use super::{AttrError, IpFamily, NativeIpAddress, NativeIpPrefix, WireIpAddress, WireIpPrefix};

/// Parses a MAC address from a string of hex digits with arbitrary
/// separators. Digit pairs pack big-endian into six bytes; anything other
/// than exactly twelve hex digits is malformed.
pub fn parse_mac(s: &str) -> Result<[u8; 6], AttrError> {
    let mut mac = [0u8; 6];
    let mut digits = 0usize;

    for b in s.bytes() {
        let nibble = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => continue,
        };

        if digits < 12 {
            mac[digits / 2] = (mac[digits / 2] << 4) | nibble;
        }
        digits += 1;
    }

    if digits == 12 {
        Ok(mac)
    } else {
        Err(AttrError::MalformedAddress {
            family: "MAC",
            input: s.to_string(),
        })
    }
}

/// Renders a MAC as lowercase, zero-padded, colon-separated hex.
pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Parses a dotted-decimal IPv4 string into a network-byte-order word.
///
/// Digit runs accumulate a byte; any non-digit shifts it into the word.
/// Malformed input is not rejected, it just produces whatever the
/// accumulator ends up with. Peers depend on this tolerance, so it stays;
/// the warn log makes it observable.
pub fn parse_ipv4(s: &str) -> u32 {
    let mut word: u32 = 0;
    let mut byte: u8 = 0;

    for b in s.bytes() {
        if b.is_ascii_digit() {
            byte = byte.wrapping_mul(10).wrapping_add(b - b'0');
        } else {
            word = (word << 8) | u32::from(byte);
            byte = 0;
        }
    }
    word = (word << 8) | u32::from(byte);

    if s.parse::<Ipv4Addr>().is_err() {
        warn!("tolerating malformed IPv4 address '{s}'");
    }

    word.to_be()
}

/// Renders a network-byte-order IPv4 word in dotted-decimal form.
pub fn format_ipv4(ip4: u32) -> String {
    Ipv4Addr::from(u32::from_be(ip4)).to_string()
}

/// Parses an IPv6 presentation string into sixteen network-order bytes.
/// Malformed input yields all zeroes, logged but tolerated.
pub fn parse_ipv6(s: &str) -> [u8; 16] {
    match s.parse::<Ipv6Addr>() {
        Ok(addr) => addr.octets(),
        Err(_) => {
            warn!("tolerating malformed IPv6 address '{s}', substituting zeroes");
            [0u8; 16]
        }
    }
}

/// Renders sixteen network-order bytes in IPv6 presentation form.
pub fn format_ipv6(ip6: &[u8; 16]) -> String {
    Ipv6Addr::from(*ip6).to_string()
}

/// Converts a family-tagged wire IP address to its native form.
pub fn parse_ip_address(wire: &WireIpAddress) -> NativeIpAddress {
    match wire.family {
        IpFamily::V4 => NativeIpAddress::V4(parse_ipv4(&wire.addr)),
        IpFamily::V6 => NativeIpAddress::V6(parse_ipv6(&wire.addr)),
    }
}

/// Converts a native IP address back to its family-tagged wire form.
pub fn format_ip_address(native: &NativeIpAddress) -> WireIpAddress {
    match native {
        NativeIpAddress::V4(ip4) => WireIpAddress {
            family: IpFamily::V4,
            addr: format_ipv4(*ip4),
        },
        NativeIpAddress::V6(ip6) => WireIpAddress {
            family: IpFamily::V6,
            addr: format_ipv6(ip6),
        },
    }
}

/// Converts a family-tagged wire IP prefix (address plus mask) to native.
pub fn parse_ip_prefix(wire: &WireIpPrefix) -> NativeIpPrefix {
    match wire.family {
        IpFamily::V4 => NativeIpPrefix::V4 {
            addr: parse_ipv4(&wire.addr),
            mask: parse_ipv4(&wire.mask),
        },
        IpFamily::V6 => NativeIpPrefix::V6 {
            addr: parse_ipv6(&wire.addr),
            mask: parse_ipv6(&wire.mask),
        },
    }
}

/// Converts a native IP prefix back to its wire form.
pub fn format_ip_prefix(native: &NativeIpPrefix) -> WireIpPrefix {
    match native {
        NativeIpPrefix::V4 { addr, mask } => WireIpPrefix {
            family: IpFamily::V4,
            addr: format_ipv4(*addr),
            mask: format_ipv4(*mask),
        },
        NativeIpPrefix::V6 { addr, mask } => WireIpPrefix {
            family: IpFamily::V6,
            addr: format_ipv6(addr),
            mask: format_ipv6(mask),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_parses_colon_separated() {
        let mac = parse_mac("aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(mac, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn mac_separators_are_arbitrary() {
        assert_eq!(
            parse_mac("AABB.ccdd-EEff").unwrap(),
            [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]
        );
        assert_eq!(parse_mac("001122334455").unwrap(), [0, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn mac_wrong_digit_count_is_rejected() {
        assert!(parse_mac("aa:bb:cc:dd:ee").is_err());
        assert!(parse_mac("aa:bb:cc:dd:ee:ff:00").is_err());
        assert!(parse_mac("").is_err());
    }

    #[test]
    fn mac_round_trip() {
        let text = "aa:bb:cc:dd:ee:ff";
        assert_eq!(format_mac(&parse_mac(text).unwrap()), text);
        assert_eq!(format_mac(&[0, 1, 2, 3, 4, 5]), "00:01:02:03:04:05");
    }

    #[test]
    fn ipv4_network_byte_order() {
        let word = parse_ipv4("192.168.1.1");
        assert_eq!(word, 0xC0A80101u32.to_be());
        assert_eq!(word.to_ne_bytes(), [0xC0, 0xA8, 0x01, 0x01]);
    }

    #[test]
    fn ipv4_round_trip() {
        for text in ["192.168.1.1", "0.0.0.0", "255.255.255.255", "10.0.0.1"] {
            assert_eq!(format_ipv4(parse_ipv4(text)), text);
        }
    }

    #[test]
    fn ipv4_malformed_is_tolerated() {
        // The accumulator parser never errors; an empty string is a zero.
        assert_eq!(parse_ipv4(""), 0);
        // Trailing garbage still yields a number rather than a failure.
        let _ = parse_ipv4("192.168.bogus");
    }

    #[test]
    fn ipv6_round_trip() {
        for text in ["2001:db8::1", "::1", "fe80::aabb:ccff:fedd:eeff"] {
            assert_eq!(format_ipv6(&parse_ipv6(text)), text);
        }
    }

    #[test]
    fn ipv6_malformed_is_zeroed() {
        assert_eq!(parse_ipv6("not-an-address"), [0u8; 16]);
    }

    #[test]
    fn ip_address_family_dispatch() {
        let v4 = WireIpAddress {
            family: IpFamily::V4,
            addr: "10.1.2.3".to_string(),
        };
        assert_eq!(
            parse_ip_address(&v4),
            NativeIpAddress::V4(0x0A010203u32.to_be())
        );
        assert_eq!(format_ip_address(&parse_ip_address(&v4)), v4);

        let v6 = WireIpAddress {
            family: IpFamily::V6,
            addr: "2001:db8::42".to_string(),
        };
        assert_eq!(format_ip_address(&parse_ip_address(&v6)), v6);
    }

    #[test]
    fn ip_prefix_round_trip() {
        let prefix = WireIpPrefix {
            family: IpFamily::V4,
            addr: "10.0.0.0".to_string(),
            mask: "255.255.255.0".to_string(),
        };
        assert_eq!(format_ip_prefix(&parse_ip_prefix(&prefix)), prefix);

        let prefix6 = WireIpPrefix {
            family: IpFamily::V6,
            addr: "2001:db8::".to_string(),
            mask: "ffff:ffff::".to_string(),
        };
        assert_eq!(format_ip_prefix(&parse_ip_prefix(&prefix6)), prefix6);
    }
}
