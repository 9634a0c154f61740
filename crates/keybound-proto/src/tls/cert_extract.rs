//! Field extraction from DER-encoded X.509 certificates.
//!
//! Thin helpers over `x509-parser` shared by the binding code, the peer
//! verifier and the connection wrappers.
//!
//! Reference: `x509-parser` crate (rusticata, MIT/Apache-2.0)

use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::X509Extension;
use x509_parser::prelude::FromDer;

use crate::error::VerifyError;

/// Parse exactly one certificate from `cert_der`.
///
/// Trailing bytes after the certificate are rejected.
pub fn parse_certificate(cert_der: &[u8]) -> Result<X509Certificate<'_>, VerifyError> {
    let (rest, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| VerifyError::Malformed(format!("X.509 parse error: {e}")))?;
    if !rest.is_empty() {
        return Err(VerifyError::Malformed(format!(
            "{} trailing bytes after certificate",
            rest.len()
        )));
    }
    Ok(cert)
}

/// The first common name in the certificate subject, if any.
pub fn subject_common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_owned)
}

/// Find an extension by its OID arcs.
pub fn find_extension<'a, 'b>(
    cert: &'a X509Certificate<'b>,
    oid: &[u64],
) -> Option<&'a X509Extension<'b>> {
    cert.extensions().iter().find(|ext| {
        ext.oid
            .iter()
            .map(|arcs| arcs.eq(oid.iter().copied()))
            .unwrap_or(false)
    })
}

/// Parse `cert_der` and return its subject common name.
pub fn common_name_from_der(cert_der: &[u8]) -> Result<String, VerifyError> {
    let cert = parse_certificate(cert_der)?;
    subject_common_name(&cert)
        .ok_or_else(|| VerifyError::Malformed("certificate has no subject common name".into()))
}
