use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Textual address that could not be parsed. The caller decides whether to
/// log it; the codec never does.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address format: {0:?}")]
pub struct AddrParseError(pub String);

/// IPv4 address as the 4 raw wire bytes, network order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Address(pub [u8; 4]);

impl Ipv4Address {
    /// 0.0.0.0
    pub const ANY: Ipv4Address = Ipv4Address([0; 4]);
    /// 255.255.255.255
    pub const BROADCAST: Ipv4Address = Ipv4Address([0xff; 4]);

    pub fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl FromStr for Ipv4Address {
    type Err = AddrParseError;

    /// Exactly four dot-separated decimal octets in [0, 255]. Anything
    /// else (missing/extra separators, empty or non-digit components,
    /// out-of-range values) is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 4];
        let mut parts = s.split('.');
        for slot in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| AddrParseError(s.to_string()))?;
            *slot = parse_decimal_octet(part).ok_or_else(|| AddrParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddrParseError(s.to_string()));
        }
        Ok(Ipv4Address(octets))
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

fn parse_decimal_octet(s: &str) -> Option<u8> {
    if s.is_empty() || s.len() > 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // At most 3 digits, so u16 cannot overflow.
    let v: u16 = s.parse().ok()?;
    u8::try_from(v).ok()
}

/// Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// All-zero sentinel: "resolve from the interface on open".
    pub const UNSET: MacAddr = MacAddr([0; 6]);
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn is_unset(&self) -> bool {
        self.0 == [0; 6]
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddr {
    type Err = AddrParseError;

    /// Six hex octets separated by `:` (or `-`), 1 or 2 digits each.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let mut bytes = [0u8; 6];
        let mut parts = s.split(sep);
        for slot in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| AddrParseError(s.to_string()))?;
            if part.is_empty() || part.len() > 2 {
                return Err(AddrParseError(s.to_string()));
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| AddrParseError(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(AddrParseError(s.to_string()));
        }
        Ok(MacAddr(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}
