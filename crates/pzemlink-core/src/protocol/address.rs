use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Four-byte selector identifying one meter on a shared serial bus.
///
/// Meters print and accept it in dotted form (`192.168.1.1`), but it carries
/// no network meaning: the bytes are copied verbatim into command frames.
///
/// # Examples
/// ```
/// use pzemlink_core::DeviceAddress;
///
/// let addr: DeviceAddress = "192.168.1.1".parse()?;
/// assert_eq!(addr.octets(), [192, 168, 1, 1]);
/// assert_eq!(addr.to_string(), "192.168.1.1");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DeviceAddress([u8; 4]);

impl DeviceAddress {
    pub const fn new(octets: [u8; 4]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for DeviceAddress {
    fn from(octets: [u8; 4]) -> Self {
        Self(octets)
    }
}

impl From<DeviceAddress> for [u8; 4] {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid device address '{input}': expected four dotted octets (0-255)")]
pub struct AddressParseError {
    input: String,
}

impl FromStr for DeviceAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressParseError {
            input: s.to_string(),
        };
        let mut octets = [0u8; 4];
        let mut parts = s.trim().split('.');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(err)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            *octet = part.parse().map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self(octets))
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceAddress;

    #[test]
    fn parse_dotted_octets() {
        let addr: DeviceAddress = "10.0.0.255".parse().unwrap();
        assert_eq!(addr.octets(), [10, 0, 0, 255]);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for input in ["", "1.2.3", "1.2.3.4.5", "1.2.3.256", "1.2.-3.4", "a.b.c.d", "1..2.3"] {
            assert!(input.parse::<DeviceAddress>().is_err(), "{input}");
        }
    }

    #[test]
    fn display_round_trips_octets() {
        let addr = DeviceAddress::new([192, 168, 1, 1]);
        assert_eq!(addr.to_string(), "192.168.1.1");
    }

    #[test]
    fn serializes_as_dotted_string() {
        let addr = DeviceAddress::new([1, 2, 3, 4]);
        let json = serde_json::to_string(&addr).expect("address json");
        assert_eq!(json, "\"1.2.3.4\"");
    }
}
