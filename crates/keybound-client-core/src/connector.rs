//! QUIC connector.
//!
//! `Connector` dials a [`ServerIdentity`], accepting the connection only if
//! the peer's certificate proves control of the identity's public key.
//! Transient failures are retried according to the [`RetryPolicy`]; a
//! certificate rejection ends the dial at once.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use keybound_proto::identity::{ConnType, ServerIdentity};
use keybound_proto::suite::Suite;
use keybound_proto::tls::config::build_client_tls_config;
use keybound_proto::tls::verifier::IdentityServerCertVerifier;
use tracing::{debug, info};

use crate::config::{ConnectorConfig, RetryPolicy};
use crate::connection::PeerConnection;
use crate::error::{ClientError, Result};
use crate::retry::retry_connect;

/// SNI server name used in the TLS handshake.
///
/// The verifier ignores SNI (it matches the certificate CN instead), but
/// quinn requires a valid server name for `connect()`.
pub const SNI_SERVER_NAME: &str = "keybound";

/// Dials keybound peers from one local QUIC endpoint.
pub struct Connector<S: Suite> {
    endpoint: quinn::Endpoint,
    suite: S,
    policy: RetryPolicy,
}

impl<S: Suite> Connector<S> {
    /// Create a connector bound to an ephemeral UDP port.
    ///
    /// The endpoint is dual-stack where the host allows it, IPv4-only
    /// otherwise. Must be called from within a tokio runtime.
    pub fn new(suite: S, config: &ConnectorConfig) -> Result<Self> {
        config.validate()?;

        let endpoint = bind_client_endpoint()?;

        Ok(Self {
            endpoint,
            suite,
            policy: config.retry,
        })
    }

    /// Create a connector with default configuration.
    pub fn with_defaults(suite: S) -> Result<Self> {
        Self::new(suite, &ConnectorConfig::default())
    }

    /// Dial `peer` and verify that it holds `peer.public_key()`.
    ///
    /// Only `tls://` addresses are accepted. Up to `max_attempts` dials are
    /// made, `wait_retry` apart.
    pub async fn connect(&self, peer: &ServerIdentity<S>) -> Result<PeerConnection> {
        let address = peer.address();
        if address.conn_type() != ConnType::Tls {
            return Err(ClientError::NotTls(address.to_string()));
        }

        let conn = retry_connect(&self.policy, |attempt| self.dial_once(peer, attempt)).await?;

        info!(
            peer = %conn.peer_subject(),
            remote = %conn.remote_address(),
            "connected to peer"
        );
        Ok(conn)
    }

    /// One dial: try each resolved address of the peer in turn.
    async fn dial_once(&self, peer: &ServerIdentity<S>, attempt: u32) -> Result<PeerConnection> {
        let host_port = peer.address().host_port();
        let remotes = dialable(resolve(host_port).await?, self.local_addr()?);

        let mut last = None;
        for remote in remotes {
            debug!(attempt, %remote, expected = %peer.public_key(), "dialing peer");
            match self.handshake(peer, remote).await {
                Ok(conn) => return Ok(conn),
                Err(e @ ClientError::Untrusted(_)) => return Err(e),
                Err(e) => {
                    debug!(attempt, %remote, error = %e, "address failed");
                    last = Some(e);
                }
            }
        }

        Err(last.unwrap_or_else(|| ClientError::Resolve {
            host: host_port.to_owned(),
            reason: "no address reachable from the local endpoint".into(),
        }))
    }

    /// Dial + handshake with `remote` under a fresh verifier.
    async fn handshake(
        &self,
        peer: &ServerIdentity<S>,
        remote: SocketAddr,
    ) -> Result<PeerConnection> {
        let verifier = Arc::new(IdentityServerCertVerifier::new(
            self.suite.clone(),
            peer.public_key().clone(),
        ));
        let rustls_config = build_client_tls_config(Arc::clone(&verifier))?;

        let quic_client_config = quinn::crypto::rustls::QuicClientConfig::try_from(rustls_config)
            .map_err(|e| ClientError::TlsConfig(format!("rustls→quinn: {e}")))?;
        let client_config = quinn::ClientConfig::new(Arc::new(quic_client_config));

        let connecting = self
            .endpoint
            .connect_with(client_config, remote, SNI_SERVER_NAME)?;

        match connecting.await {
            Ok(conn) => PeerConnection::from_quinn(conn),
            Err(e) => match verifier.take_rejection() {
                Some(rejection) => Err(ClientError::Untrusted(rejection)),
                None => Err(e.into()),
            },
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint
            .local_addr()
            .map_err(|e| ClientError::Endpoint(e.to_string()))
    }

    /// Gracefully shut down the endpoint.
    pub fn close(&self) {
        self.endpoint.close(0u32.into(), b"shutdown");
    }
}

impl<S: Suite> std::fmt::Debug for Connector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("suite", &self.suite)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Bind `[::]:0`, falling back to `0.0.0.0:0` on hosts without IPv6.
fn bind_client_endpoint() -> Result<quinn::Endpoint> {
    match quinn::Endpoint::client(SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))) {
        Ok(endpoint) => Ok(endpoint),
        Err(e) => {
            debug!(error = %e, "IPv6 bind failed, using an IPv4-only endpoint");
            quinn::Endpoint::client(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
                .map_err(|e| ClientError::Endpoint(e.to_string()))
        }
    }
}

/// Resolve `host:port` to all of its socket addresses, in resolver order.
async fn resolve(host_port: &str) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(host_port)
        .await
        .map_err(|e| ClientError::Resolve {
            host: host_port.to_owned(),
            reason: e.to_string(),
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ClientError::Resolve {
            host: host_port.to_owned(),
            reason: "no addresses".into(),
        });
    }
    Ok(addrs)
}

/// Drop addresses an IPv4-only endpoint cannot reach.
fn dialable(remotes: Vec<SocketAddr>, local: SocketAddr) -> Vec<SocketAddr> {
    if local.is_ipv6() {
        return remotes;
    }
    remotes.into_iter().filter(SocketAddr::is_ipv4).collect()
}
