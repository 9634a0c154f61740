//! keybound server-side transport core.
//!
//! - QUIC server (accepts incoming connections via quinn)
//! - On-demand identity certificates from a
//!   [`CertificateAuthority`](keybound_proto::CertificateAuthority)

pub mod connection;
pub mod error;
pub mod listener;

pub use connection::InboundConnection;
pub use error::ServerError;
pub use listener::Listener;
