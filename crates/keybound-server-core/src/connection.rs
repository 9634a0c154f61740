//! Accepted QUIC connection wrapper (server-side).
//!
//! Clients are not asked for a certificate, so an inbound connection is
//! known only by its remote address.

use std::net::SocketAddr;

/// An established inbound connection.
#[derive(Debug)]
pub struct InboundConnection {
    inner: quinn::Connection,
}

impl InboundConnection {
    pub fn from_quinn(conn: quinn::Connection) -> Self {
        Self { inner: conn }
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
