//! QUIC server endpoint.
//!
//! `Listener` wraps a quinn server endpoint whose TLS layer asks a
//! [`CertificateAuthority`] for the certificate to present on every
//! handshake. The authority serves its cached certificate and renews it
//! once it nears expiry, so a long-running listener never needs to be
//! rebuilt.

use std::net::SocketAddr;
use std::sync::Arc;

use keybound_proto::authority::CertificateAuthority;
use keybound_proto::identity::{Address, ServerIdentity};
use keybound_proto::suite::Suite;
use keybound_proto::tls::config::build_server_tls_config;
use tracing::info;

use crate::connection::InboundConnection;
use crate::error::{Result, ServerError};

/// A QUIC server endpoint that proves its identity to dialing peers.
pub struct Listener<S: Suite> {
    endpoint: quinn::Endpoint,
    authority: Arc<CertificateAuthority<S>>,
}

impl<S: Suite> Listener<S> {
    /// Bind a QUIC server to the given address.
    ///
    /// No certificate is issued until the first handshake. Must be called
    /// from within a tokio runtime.
    pub fn bind(addr: SocketAddr, authority: Arc<CertificateAuthority<S>>) -> Result<Self> {
        let rustls_config = build_server_tls_config(Arc::clone(&authority))?;

        let quic_server_config = quinn::crypto::rustls::QuicServerConfig::try_from(rustls_config)
            .map_err(|e| ServerError::TlsConfig(format!("rustls→quinn: {e}")))?;

        let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));

        let endpoint = quinn::Endpoint::server(server_config, addr)
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        info!(
            %addr,
            identity = %authority.identity().public_key(),
            "listener bound"
        );

        Ok(Self {
            endpoint,
            authority,
        })
    }

    /// Accept the next incoming connection.
    pub async fn accept(&self) -> Result<InboundConnection> {
        let incoming = self.endpoint.accept().await.ok_or(ServerError::Closed)?;

        let conn = InboundConnection::from_quinn(incoming.await?);

        info!(remote = %conn.remote_address(), "accepted connection");

        Ok(conn)
    }

    /// Returns the local address this endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))
    }

    /// The `tls://` address peers can dial.
    pub fn address(&self) -> Result<Address> {
        Ok(Address::tls(self.local_addr()?.to_string())?)
    }

    /// What a peer needs to dial this listener and verify it.
    pub fn server_identity(&self) -> Result<ServerIdentity<S>> {
        Ok(self.authority.identity().server_identity(self.address()?))
    }

    pub fn authority(&self) -> &Arc<CertificateAuthority<S>> {
        &self.authority
    }

    /// Gracefully shut down the endpoint.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"shutdown");
    }
}

impl<S: Suite> std::fmt::Debug for Listener<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}
