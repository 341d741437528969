//! IP address, protocol, and filesystem object-class helpers (spec §6).

use crate::error::QueryError;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A parsed IPv4 or IPv6 address as a 128-bit value; IPv4 occupies the low
/// 32 bits (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IpAddrValue(pub u128);

impl IpAddrValue {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let addr: IpAddr = text.parse().map_err(|_| QueryError::InvalidArgument {
            reason: format!("'{text}' is not a valid IPv4/IPv6 address"),
        })?;
        Ok(match addr {
            IpAddr::V4(v4) => IpAddrValue(u32::from(v4) as u128),
            IpAddr::V6(v6) => IpAddrValue(u128::from(v6)),
        })
    }

    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        if self.0 <= u32::MAX as u128 {
            Some(Ipv4Addr::from(self.0 as u32))
        } else {
            None
        }
    }

    pub fn as_ipv6(&self) -> Ipv6Addr {
        Ipv6Addr::from(self.0)
    }
}

impl fmt::Display for IpAddrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_ipv4() {
            Some(v4) if self.0 >> 32 == 0 => write!(f, "{v4}"),
            _ => write!(f, "{}", self.as_ipv6()),
        }
    }
}

/// `tcp`/`udp` protocol strings mapped to their IANA numbers (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const TCP_NUMBER: u8 = 6;
    pub const UDP_NUMBER: u8 = 17;

    pub fn iana_number(&self) -> u8 {
        match self {
            Protocol::Tcp => Self::TCP_NUMBER,
            Protocol::Udp => Self::UDP_NUMBER,
        }
    }

    pub fn from_iana_number(n: u8) -> Option<Self> {
        match n {
            Self::TCP_NUMBER => Some(Protocol::Tcp),
            Self::UDP_NUMBER => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn from_str_keyword(s: &str) -> Option<Self> {
        match s {
            "tcp" => Some(Protocol::Tcp),
            "udp" => Some(Protocol::Udp),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

/// Object-class strings for file types, round-tripping to a fixed
/// enumeration (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum FileType {
    Block,
    Char,
    Dir,
    Fifo,
    File,
    Link,
    Sock,
    Any,
}

impl FileType {
    pub const ALL: &'static [FileType] = &[
        FileType::Block,
        FileType::Char,
        FileType::Dir,
        FileType::Fifo,
        FileType::File,
        FileType::Link,
        FileType::Sock,
        FileType::Any,
    ];

    /// `ls -l`-style leading letter used by file_contexts entries
    /// (`-d`, `-c`, `-b`, `--`, `-p`, `-l`, `-s`, or no suffix for `any`).
    pub fn letter(&self) -> &'static str {
        match self {
            FileType::Block => "-b",
            FileType::Char => "-c",
            FileType::Dir => "-d",
            FileType::Fifo => "-p",
            FileType::File => "--",
            FileType::Link => "-l",
            FileType::Sock => "-s",
            FileType::Any => "any",
        }
    }

    pub fn from_letter(s: &str) -> Option<Self> {
        Self::ALL.iter().find(|ft| ft.letter() == s).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_roundtrips_in_low_32_bits() {
        let parsed = IpAddrValue::parse("192.168.1.1").unwrap();
        assert_eq!(parsed.0 >> 32, 0);
        assert_eq!(parsed.as_ipv4(), Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn ipv6_parses_to_full_128_bits() {
        let parsed = IpAddrValue::parse("::1").unwrap();
        assert_eq!(parsed.0, 1u128);
    }

    #[test]
    fn invalid_address_is_rejected() {
        assert!(IpAddrValue::parse("not-an-address").is_err());
    }

    #[test]
    fn protocol_roundtrips() {
        assert_eq!(Protocol::from_iana_number(Protocol::Tcp.iana_number()), Some(Protocol::Tcp));
        assert_eq!(Protocol::from_str_keyword("udp"), Some(Protocol::Udp));
    }

    #[test]
    fn file_type_letter_roundtrips() {
        for ft in FileType::ALL {
            assert_eq!(FileType::from_letter(ft.letter()), Some(*ft));
        }
    }
}
