//! Short-lived self-signed certificates carrying an identity binding.
//!
//! Every certificate gets its own freshly generated ECDSA P-256 keypair. That
//! key signs the X.509 structure and the TLS handshake; it is thrown away when
//! the certificate is replaced. The node's long-term identity key never
//! touches the certificate directly, it only signs the
//! [`SignedBinding`](crate::binding::SignedBinding) embedded in it.
//!
//! Fixed policy:
//! - validity: 1 day before issuance through 2 days after
//! - cache expiry: 1 hour before the stated not-after
//! - extended key usage: server and client authentication
//! - basic constraints: not a CA, path length 1
//!
//! Reference: `rcgen` crate (rustls team, MIT/Apache-2.0)
//! <https://github.com/rustls/rcgen>

use std::fmt;
use std::sync::Arc;

use rcgen::{
    CertificateParams, CustomExtension, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, PrintableString, PKCS_ECDSA_P256_SHA256,
};
use rustls::sign::CertifiedKey;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use time::{Duration, OffsetDateTime};

use crate::binding::SignedBinding;
use crate::error::{IssueError, VerifyError};
use crate::serial::SerialNumber;
use crate::tls::cert_extract::{parse_certificate, subject_common_name};

/// How far before issuance the certificate becomes valid (clock skew slack).
pub const VALIDITY_BEFORE: Duration = Duration::days(1);

/// How long after issuance the certificate stays valid.
pub const VALIDITY_AFTER: Duration = Duration::days(2);

/// The cache stops serving a certificate this long before peers reject it.
pub const CACHE_MARGIN: Duration = Duration::hours(1);

/// basicConstraints: 2.5.29.19
const BASIC_CONSTRAINTS_OID: &[u64] = &[2, 5, 29, 19];

/// DER of `BasicConstraints { cA: FALSE (default, omitted), pathLenConstraint: 1 }`.
const NOT_CA_PATH_LEN_ONE: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x01];

/// Fields read back from an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafInfo {
    pub serial: SerialNumber,
    pub subject: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl LeafInfo {
    /// Parse the fields the authority cares about out of `cert_der`.
    pub fn parse(cert_der: &[u8]) -> Result<Self, VerifyError> {
        let cert = parse_certificate(cert_der)?;
        let serial = SerialNumber::from_be_slice(cert.tbs_certificate.raw_serial())
            .ok_or_else(|| VerifyError::Malformed("serial number exceeds 128 bits".into()))?;
        let subject = subject_common_name(&cert)
            .ok_or_else(|| VerifyError::Malformed("certificate has no subject common name".into()))?;
        let validity = cert.validity();
        let not_before = OffsetDateTime::from_unix_timestamp(validity.not_before.timestamp())
            .map_err(|e| VerifyError::Malformed(format!("not_before: {e}")))?;
        let not_after = OffsetDateTime::from_unix_timestamp(validity.not_after.timestamp())
            .map_err(|e| VerifyError::Malformed(format!("not_after: {e}")))?;
        Ok(Self {
            serial,
            subject,
            not_before,
            not_after,
        })
    }
}

/// Inputs for one self-signed certificate.
pub(crate) struct CertificateTemplate<'a> {
    pub serial: SerialNumber,
    pub subject: &'a str,
    /// `None` only when building deliberately broken certificates in tests.
    pub binding: Option<&'a SignedBinding>,
    pub now: OffsetDateTime,
}

/// A certificate issued by a [`CertificateAuthority`](crate::authority::CertificateAuthority).
///
/// Immutable once built. The authority replaces it wholesale on renewal.
pub struct IssuedCertificate {
    /// DER-encoded certificate bytes.
    cert_der: CertificateDer<'static>,
    /// PEM-encoded certificate string.
    cert_pem: String,
    /// Certificate plus the ephemeral signing key, ready for rustls.
    certified_key: Arc<CertifiedKey>,
    /// SubjectPublicKeyInfo DER of the ephemeral key.
    ephemeral_public_key: Vec<u8>,
    leaf: LeafInfo,
    /// When the authority must stop serving this certificate.
    cache_expires: OffsetDateTime,
}

impl IssuedCertificate {
    /// Generate a fresh ephemeral keypair and self-sign a certificate with it.
    pub(crate) fn self_sign(template: CertificateTemplate<'_>) -> Result<Self, IssueError> {
        let key_pair = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
            .map_err(|e| IssueError::KeyGeneration(e.to_string()))?;

        let common_name = PrintableString::try_from(template.subject.to_owned()).map_err(|e| {
            IssueError::CertificateGeneration(format!("subject is not printable: {e}"))
        })?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, DnValue::PrintableString(common_name));

        let mut params = CertificateParams::new(vec![])
            .map_err(|e| IssueError::CertificateGeneration(format!("invalid cert params: {e}")))?;
        params.distinguished_name = dn;
        params.serial_number = Some(rcgen::SerialNumber::from_slice(
            &template.serial.to_be_bytes(),
        ));
        params.not_before = template.now - VALIDITY_BEFORE;
        params.not_after = template.now + VALIDITY_AFTER;
        params.is_ca = IsCa::NoCa;
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let mut basic_constraints =
            CustomExtension::from_oid_content(BASIC_CONSTRAINTS_OID, NOT_CA_PATH_LEN_ONE.to_vec());
        basic_constraints.set_criticality(true);
        params.custom_extensions.push(basic_constraints);
        if let Some(binding) = template.binding {
            params.custom_extensions.push(binding.to_extension());
        }

        let cert = params
            .self_signed(&key_pair)
            .map_err(|e| IssueError::CertificateGeneration(e.to_string()))?;
        let cert_der = cert.der().clone();
        let cert_pem = cert.pem();

        let leaf = LeafInfo::parse(&cert_der).map_err(|e| {
            IssueError::CertificateGeneration(format!("issued certificate does not parse: {e}"))
        })?;

        let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
        let signing_key = rustls::crypto::ring::sign::any_ecdsa_type(&key_der)
            .map_err(|e| IssueError::KeyGeneration(format!("rustls signing key: {e}")))?;
        let certified_key = Arc::new(CertifiedKey::new(vec![cert_der.clone()], signing_key));

        let cache_expires = leaf.not_after - CACHE_MARGIN;

        Ok(Self {
            cert_der,
            cert_pem,
            certified_key,
            ephemeral_public_key: key_pair.public_key_der(),
            leaf,
            cache_expires,
        })
    }

    /// Returns the DER-encoded certificate bytes.
    pub fn der(&self) -> &[u8] {
        &self.cert_der
    }

    pub fn cert_der(&self) -> &CertificateDer<'static> {
        &self.cert_der
    }

    /// Returns the PEM-encoded certificate string.
    pub fn pem(&self) -> &str {
        &self.cert_pem
    }

    /// The certificate and its ephemeral key in the form rustls presents.
    pub fn certified_key(&self) -> Arc<CertifiedKey> {
        Arc::clone(&self.certified_key)
    }

    /// DER SubjectPublicKeyInfo of the ephemeral certificate key.
    pub fn ephemeral_public_key_der(&self) -> &[u8] {
        &self.ephemeral_public_key
    }

    pub fn leaf(&self) -> &LeafInfo {
        &self.leaf
    }

    pub fn serial(&self) -> SerialNumber {
        self.leaf.serial
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.leaf.not_after
    }

    pub fn cache_expires(&self) -> OffsetDateTime {
        self.cache_expires
    }

    /// Whether the cache may still hand out this certificate at `now`.
    pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
        now < self.cache_expires
    }
}

impl fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("leaf", &self.leaf)
            .field("cache_expires", &self.cache_expires)
            .finish_non_exhaustive()
    }
}
