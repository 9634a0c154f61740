//! Verified QUIC connection wrapper (client-side).
//!
//! After the TLS handshake succeeds, `PeerConnection` wraps the raw
//! `quinn::Connection` and caches the verified peer subject.

use std::net::SocketAddr;

use keybound_proto::tls::cert_extract::common_name_from_der;
use rustls_pki_types::CertificateDer;

use crate::error::{ClientError, Result};

/// A QUIC connection whose peer proved control of the expected key.
#[derive(Debug)]
pub struct PeerConnection {
    inner: quinn::Connection,
    peer_subject: String,
}

impl PeerConnection {
    /// Wrap a raw quinn connection, reading the peer subject from its
    /// certificate.
    pub fn from_quinn(conn: quinn::Connection) -> Result<Self> {
        let peer_subject = extract_peer_subject(&conn)?;
        Ok(Self {
            inner: conn,
            peer_subject,
        })
    }

    /// The peer's public key string, as carried in its certificate CN.
    pub fn peer_subject(&self) -> &str {
        &self.peer_subject
    }

    pub fn remote_address(&self) -> SocketAddr {
        self.inner.remote_address()
    }

    /// Access the underlying quinn connection.
    pub fn inner(&self) -> &quinn::Connection {
        &self.inner
    }

    pub fn close(&self) {
        self.inner.close(0u32.into(), b"done");
    }
}

fn extract_peer_subject(conn: &quinn::Connection) -> Result<String> {
    let identity = conn
        .peer_identity()
        .ok_or_else(|| ClientError::PeerIdentity("no peer identity available".into()))?;

    let certs = identity
        .downcast::<Vec<CertificateDer<'static>>>()
        .map_err(|_| ClientError::PeerIdentity("failed to downcast peer identity".into()))?;

    let leaf = certs
        .first()
        .ok_or_else(|| ClientError::PeerIdentity("peer certificate chain is empty".into()))?;

    common_name_from_der(leaf).map_err(|e| ClientError::PeerIdentity(e.to_string()))
}
