//! Peer certificate verification.
//!
//! [`verify_peer_chain`] replaces chain-of-trust validation. A peer is
//! accepted only if it presents a single self-signed certificate whose
//! subject is the public key we expected and whose identity binding was
//! signed by that same key. The certificate's own signature is checked, but
//! only as a consistency check: the trust decision rests on the binding.
//!
//! The function is pure. The rustls adapter lives in [`crate::tls::verifier`].

use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::ParsedExtension;
use x509_parser::x509::X509Version;

use crate::binding::SignedBinding;
use crate::error::VerifyError;
use crate::suite::Suite;
use crate::tls::cert_extract::{parse_certificate, subject_common_name};

/// What a successful verification established about the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPeer {
    /// Subject CN, equal to the expected public key string.
    pub subject: String,
    /// Big-endian serial of the presented certificate.
    pub serial: Vec<u8>,
    /// Stated expiry, seconds since the Unix epoch.
    pub not_after: i64,
}

/// Decide whether `chain` proves control of `expected`.
///
/// Checks, in order:
/// 1. exactly one certificate;
/// 2. it is self-signed, valid at `now_epoch_secs`, a v3 leaf with
///    server-auth usage and no unknown critical extensions;
/// 3. its subject CN equals `expected.to_string()`;
/// 4. it carries the binding extension;
/// 5. the binding verifies against `expected`.
pub fn verify_peer_chain<S: Suite>(
    suite: &S,
    expected: &S::PublicKey,
    chain: &[&[u8]],
    now_epoch_secs: i64,
) -> Result<VerifiedPeer, VerifyError> {
    if chain.len() != 1 {
        return Err(VerifyError::ChainLength(chain.len()));
    }
    let cert = parse_certificate(chain[0])?;

    check_self_signed(&cert)?;
    check_validity(&cert, now_epoch_secs)?;
    check_structure(&cert)?;

    let expected_subject = expected.to_string();
    let subject = subject_common_name(&cert).unwrap_or_default();
    if subject != expected_subject {
        return Err(VerifyError::SubjectMismatch {
            expected: expected_subject,
            found: subject,
        });
    }

    let binding = SignedBinding::from_certificate(&cert)?;
    binding.verify(suite, expected)?;

    Ok(VerifiedPeer {
        subject,
        serial: binding.serial().to_vec(),
        not_after: cert.validity().not_after.timestamp(),
    })
}

fn check_self_signed(cert: &X509Certificate<'_>) -> Result<(), VerifyError> {
    if cert.issuer().as_raw() != cert.subject().as_raw() {
        return Err(VerifyError::SelfSignature(
            "issuer differs from subject".into(),
        ));
    }
    // `None` verifies against the certificate's own public key.
    cert.verify_signature(None)
        .map_err(|e| VerifyError::SelfSignature(e.to_string()))
}

fn check_validity(cert: &X509Certificate<'_>, now: i64) -> Result<(), VerifyError> {
    let not_before = cert.validity().not_before.timestamp();
    let not_after = cert.validity().not_after.timestamp();
    if now < not_before {
        return Err(VerifyError::NotYetValid { not_before, now });
    }
    if now > not_after {
        return Err(VerifyError::Expired { not_after, now });
    }
    Ok(())
}

fn check_structure(cert: &X509Certificate<'_>) -> Result<(), VerifyError> {
    if cert.version() != X509Version::V3 {
        return Err(VerifyError::Structure(format!(
            "expected X.509 v3, got {:?}",
            cert.version()
        )));
    }

    let basic_constraints = cert
        .basic_constraints()
        .map_err(|e| VerifyError::Structure(format!("basic constraints: {e}")))?;
    if basic_constraints.is_some_and(|bc| bc.value.ca) {
        return Err(VerifyError::Structure("certificate claims to be a CA".into()));
    }

    let eku = cert
        .extended_key_usage()
        .map_err(|e| VerifyError::Structure(format!("extended key usage: {e}")))?;
    if let Some(eku) = eku {
        if !(eku.value.any || eku.value.server_auth) {
            return Err(VerifyError::Structure(
                "extended key usage does not allow server authentication".into(),
            ));
        }
    }

    if let Some(ext) = cert.extensions().iter().find(|ext| {
        ext.critical && matches!(ext.parsed_extension(), ParsedExtension::UnsupportedExtension { .. })
    }) {
        return Err(VerifyError::Structure(format!(
            "unhandled critical extension {}",
            ext.oid
        )));
    }

    Ok(())
}
