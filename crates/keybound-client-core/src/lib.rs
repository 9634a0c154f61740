//! keybound client-side transport core.
//!
//! Dials peers named by a [`ServerIdentity`](keybound_proto::ServerIdentity):
//!
//! - QUIC client (connection initiation via quinn)
//! - Identity verification of the peer certificate during the TLS handshake
//! - Bounded retry of transient dial failures
//! - TOML-loadable connector configuration

pub mod config;
pub mod connection;
pub mod connector;
pub mod error;
pub mod retry;

pub use config::{ConnectorConfig, RetryPolicy};
pub use connection::PeerConnection;
pub use connector::Connector;
pub use error::ClientError;
