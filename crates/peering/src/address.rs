//! Canonical `host:port` peer addresses.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::PeeringError;

/// A peer address split into host and port.
///
/// IP hosts are normalized, so `"[::0001]:15600"` and `"[::1]:15600"` are the
/// same address. Hostnames are lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OriginAddress {
    pub addr: String,
    pub port: u16,
}

impl OriginAddress {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: normalize_host(&addr.into()),
            port,
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.addr.parse().ok()
    }
}

/// Normalized form of a host used for address comparisons.
pub(crate) fn normalize_host(host: &str) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => host.to_ascii_lowercase(),
    }
}

impl FromStr for OriginAddress {
    type Err = PeeringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeeringError::InvalidAddress(s.to_string());

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        let host = match host.strip_prefix('[') {
            Some(rest) => rest.strip_suffix(']').ok_or_else(invalid)?,
            // An unbracketed host must not itself contain a colon.
            None if host.contains(':') => return Err(invalid()),
            None => host,
        };
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for OriginAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.addr.contains(':') {
            write!(f, "[{}]:{}", self.addr, self.port)
        } else {
            write!(f, "{}:{}", self.addr, self.port)
        }
    }
}
