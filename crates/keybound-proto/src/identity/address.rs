//! Peer addresses: `<conn-type>://<host>:<port>`.
//!
//! Only `tls` addresses can be dialed by the connector; the other types exist
//! so that peer tables can describe nodes that speak something else and be
//! rejected up front instead of at handshake time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

/// Connection type carried in the address scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnType {
    /// Encrypted, identity-verified transport.
    Tls,
    /// Unencrypted stream transport.
    Tcp,
    /// Unencrypted stream transport without framing.
    Plain,
}

impl ConnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnType::Tls => "tls",
            ConnType::Tcp => "tcp",
            ConnType::Plain => "plain",
        }
    }
}

impl fmt::Display for ConnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tls" => Ok(ConnType::Tls),
            "tcp" => Ok(ConnType::Tcp),
            "plain" => Ok(ConnType::Plain),
            other => Err(ProtoError::InvalidAddress(format!(
                "unknown connection type {other:?}"
            ))),
        }
    }
}

/// A network address tagged with its connection type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    conn_type: ConnType,
    host_port: String,
}

impl Address {
    /// Build an address, validating that `host_port` ends in a port number.
    pub fn new(conn_type: ConnType, host_port: impl Into<String>) -> Result<Self, ProtoError> {
        let host_port = host_port.into();
        let (host, port) = host_port.rsplit_once(':').ok_or_else(|| {
            ProtoError::InvalidAddress(format!("{host_port:?} is missing a port"))
        })?;
        if host.is_empty() {
            return Err(ProtoError::InvalidAddress(format!(
                "{host_port:?} is missing a host"
            )));
        }
        port.parse::<u16>().map_err(|e| {
            ProtoError::InvalidAddress(format!("invalid port in {host_port:?}: {e}"))
        })?;
        Ok(Self {
            conn_type,
            host_port,
        })
    }

    /// Build a `tls://` address.
    pub fn tls(host_port: impl Into<String>) -> Result<Self, ProtoError> {
        Self::new(ConnType::Tls, host_port)
    }

    pub fn conn_type(&self) -> ConnType {
        self.conn_type
    }

    /// The `host:port` part, suitable for name resolution.
    pub fn host_port(&self) -> &str {
        &self.host_port
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.conn_type, self.host_port)
    }
}

impl FromStr for Address {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ProtoError::InvalidAddress(format!("{s:?} has no scheme")))?;
        Self::new(scheme.parse()?, rest)
    }
}

impl TryFrom<String> for Address {
    type Error = ProtoError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tls_address() {
        let addr: Address = "tls://127.0.0.1:7770".parse().expect("parse");
        assert_eq!(addr.conn_type(), ConnType::Tls);
        assert_eq!(addr.host_port(), "127.0.0.1:7770");
        assert_eq!(addr.to_string(), "tls://127.0.0.1:7770");
    }

    #[test]
    fn parses_hostname_and_ipv6() {
        let a: Address = "tcp://node.example.org:2000".parse().expect("parse");
        assert_eq!(a.conn_type(), ConnType::Tcp);

        let b: Address = "tls://[::1]:2000".parse().expect("parse");
        assert_eq!(b.host_port(), "[::1]:2000");
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!("udp://127.0.0.1:1".parse::<Address>().is_err());
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!("127.0.0.1:1".parse::<Address>().is_err());
    }

    #[test]
    fn rejects_missing_or_bad_port() {
        assert!(Address::tls("localhost").is_err());
        assert!(Address::tls("localhost:http").is_err());
        assert!(Address::tls(":80").is_err());
    }
}
