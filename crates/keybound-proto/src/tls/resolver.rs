//! rustls certificate supplier backed by a [`CertificateAuthority`].
//!
//! rustls calls [`ResolvesServerCert::resolve`] once per handshake. The
//! resolver asks the authority for its current certificate, which is either
//! the cached one or, past the expiry margin, a freshly issued one.

use std::sync::Arc;

use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;
use tracing::error;

use crate::authority::CertificateAuthority;
use crate::suite::Suite;

/// Presents the authority's identity certificate during TLS handshakes.
#[derive(Debug)]
pub struct AuthorityCertResolver<S: Suite> {
    authority: Arc<CertificateAuthority<S>>,
}

impl<S: Suite> AuthorityCertResolver<S> {
    pub fn new(authority: Arc<CertificateAuthority<S>>) -> Self {
        Self { authority }
    }

    pub fn authority(&self) -> &Arc<CertificateAuthority<S>> {
        &self.authority
    }
}

impl<S: Suite> ResolvesServerCert for AuthorityCertResolver<S> {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        match self.authority.obtain_certificate() {
            Ok(issued) => Some(issued.certified_key()),
            Err(e) => {
                // Returning None aborts this handshake only.
                error!(error = %e, "failed to obtain identity certificate");
                None
            }
        }
    }
}
