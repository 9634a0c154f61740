//! rustls adapter for [`verify_peer_chain`].
//!
//! `IdentityServerCertVerifier` is installed on the dialing side through
//! `ClientConfig::dangerous()`, which turns off rustls's web-PKI validation
//! (it would reject every self-signed certificate) and makes this verifier
//! the only trust decision. Handshake signatures are still checked by the
//! ring crypto provider against the certificate's ephemeral key.
//!
//! Design references:
//! - iroh: Ed25519 identity + self-signed certs + custom verifiers over quinn
//! - libp2p-tls: peer verification via X.509 extension

use std::sync::{Arc, Mutex, PoisonError};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::{CertificateError, DigitallySignedStruct, Error as TlsError, OtherError, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use tracing::{debug, warn};

use crate::error::VerifyError;
use crate::suite::Suite;
use crate::verifier::verify_peer_chain;

/// Get the ring provider's supported signature verification algorithms.
fn ring_signature_algorithms() -> &'static rustls::crypto::WebPkiSupportedAlgorithms {
    use std::sync::LazyLock;
    static ALGORITHMS: LazyLock<rustls::crypto::WebPkiSupportedAlgorithms> = LazyLock::new(|| {
        rustls::crypto::ring::default_provider().signature_verification_algorithms
    });
    &ALGORITHMS
}

/// Map a rejection onto the closest rustls certificate error.
fn to_tls_error(err: VerifyError) -> TlsError {
    let cert_err = match err {
        VerifyError::NotYetValid { .. } => CertificateError::NotValidYet,
        VerifyError::Expired { .. } => CertificateError::Expired,
        other => CertificateError::Other(OtherError(Arc::new(other))),
    };
    TlsError::InvalidCertificate(cert_err)
}

/// Server certificate verifier that expects one specific identity key.
///
/// Build one per dial: it remembers the last rejection so the caller can
/// tell a trust failure apart from a network failure after the handshake
/// aborts.
#[derive(Debug)]
pub struct IdentityServerCertVerifier<S: Suite> {
    suite: S,
    expected: S::PublicKey,
    last_rejection: Mutex<Option<VerifyError>>,
}

impl<S: Suite> IdentityServerCertVerifier<S> {
    pub fn new(suite: S, expected: S::PublicKey) -> Self {
        Self {
            suite,
            expected,
            last_rejection: Mutex::new(None),
        }
    }

    pub fn expected(&self) -> &S::PublicKey {
        &self.expected
    }

    /// Take the most recent rejection, if any.
    pub fn take_rejection(&self) -> Option<VerifyError> {
        self.last_rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<S: Suite> ServerCertVerifier for IdentityServerCertVerifier<S> {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        let mut chain: Vec<&[u8]> = Vec::with_capacity(1 + intermediates.len());
        chain.push(end_entity.as_ref());
        chain.extend(intermediates.iter().map(|c| c.as_ref()));

        let now = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);
        match verify_peer_chain(&self.suite, &self.expected, &chain, now) {
            Ok(peer) => {
                debug!(peer = %peer.subject, "verify cert -> ok");
                Ok(ServerCertVerified::assertion())
            }
            Err(err) => {
                warn!(
                    expected = %self.expected,
                    check = err.check(),
                    error = %err,
                    "verify cert -> rejected"
                );
                *self
                    .last_rejection
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(err.clone());
                Err(to_tls_error(err))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, ring_signature_algorithms())
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, ring_signature_algorithms())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        ring_signature_algorithms().supported_schemes()
    }
}
