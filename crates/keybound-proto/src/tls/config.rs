//! TLS configuration builders for QUIC server and client endpoints.
//!
//! Both builders enforce:
//! - TLS 1.3 only (required by QUIC)
//! - Ring crypto provider
//! - the keybound ALPN identifier
//!
//! The server presents certificates from a [`CertificateAuthority`] on
//! demand and does not ask clients for one. The client trusts exactly the
//! identity it was told to expect.

use std::sync::Arc;

use rustls::client::danger::ServerCertVerifier;
use rustls::server::ResolvesServerCert;

use crate::authority::CertificateAuthority;
use crate::error::{ProtoError, Result};
use crate::suite::Suite;
use crate::tls::resolver::AuthorityCertResolver;
use crate::tls::verifier::IdentityServerCertVerifier;

/// ALPN protocol identifier used by keybound.
pub const ALPN_KEYBOUND: &[u8] = b"keybound";

fn ring_provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build a `rustls::ServerConfig` that presents `authority`'s certificate.
pub fn build_server_tls_config<S: Suite>(
    authority: Arc<CertificateAuthority<S>>,
) -> Result<rustls::ServerConfig> {
    let resolver: Arc<dyn ResolvesServerCert> = Arc::new(AuthorityCertResolver::new(authority));

    let mut config = rustls::ServerConfig::builder_with_provider(ring_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
        .with_no_client_auth()
        .with_cert_resolver(resolver);

    config.alpn_protocols = vec![ALPN_KEYBOUND.to_vec()];

    Ok(config)
}

/// Build a `rustls::ClientConfig` whose only trust decision is `verifier`.
pub fn build_client_tls_config<S: Suite>(
    verifier: Arc<IdentityServerCertVerifier<S>>,
) -> Result<rustls::ClientConfig> {
    let verifier: Arc<dyn ServerCertVerifier> = verifier;

    let mut config = rustls::ClientConfig::builder_with_provider(ring_provider())
        .with_protocol_versions(&[&rustls::version::TLS13])
        .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();

    config.alpn_protocols = vec![ALPN_KEYBOUND.to_vec()];

    Ok(config)
}
