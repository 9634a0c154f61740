//! TLS integration for QUIC connections.
//!
//! The two handshake-time hooks rustls needs:
//!
//! - a certificate supplier ([`resolver`]) backed by the certificate authority
//! - a certificate verifier ([`verifier`]) backed by the peer checks
//!
//! plus config builders and certificate field extraction.

pub mod cert_extract;
pub mod config;
pub mod resolver;
pub mod verifier;
