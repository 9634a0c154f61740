//! The identity binding: proof that a certificate belongs to a long-term key.
//!
//! A certificate's own self-signature only shows that it is internally
//! consistent. What ties it to a node is a second signature, made with the
//! node's long-term identity key, over the certificate's serial number and
//! subject common name:
//!
//! ```text
//! message   = DER(INTEGER serial) || DER(PrintableString subject CN)
//! signature = Suite::sign(identity private key, message)
//! ```
//!
//! The signature travels in a non-critical X.509 extension ([`BINDING_OID`]).
//! Both fields are encoded exactly as the certificate encodes them, so anyone
//! holding the certificate can rebuild the message with a stock DER encoder.

use der::asn1::{PrintableStringRef, UintRef};
use der::{Decode, Encode, Reader, SliceReader};
use rcgen::CustomExtension;
use x509_parser::certificate::X509Certificate;

use crate::error::{IssueError, VerifyError};
use crate::serial::SerialNumber;
use crate::suite::Suite;
use crate::tls::cert_extract::{find_extension, subject_common_name};

/// Object identifier of the identity binding extension: 1.3.6.1.4.1.2499.1.1
pub const BINDING_OID: &[u64] = &[1, 3, 6, 1, 4, 1, 2499, 1, 1];

/// A signature over `(serial, subject)` made with a long-term identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBinding {
    /// Big-endian serial magnitude.
    serial: Vec<u8>,
    subject: String,
    signature: Vec<u8>,
}

impl SignedBinding {
    /// Sign `(serial, subject)` with the identity's private key.
    pub fn sign<S: Suite>(
        suite: &S,
        private: &S::PrivateKey,
        serial: SerialNumber,
        subject: &str,
    ) -> Result<Self, IssueError> {
        let serial = serial.to_be_bytes();
        let message = signed_message(&serial, subject)
            .map_err(|e| IssueError::Encoding(e.to_string()))?;
        let signature = suite
            .sign(private, &message)
            .map_err(IssueError::Binding)?;
        Ok(Self {
            serial,
            subject: subject.to_owned(),
            signature,
        })
    }

    /// Reassemble a binding from its parts.
    pub fn from_parts(serial: Vec<u8>, subject: String, signature: Vec<u8>) -> Self {
        Self {
            serial,
            subject,
            signature,
        }
    }

    /// Read the binding out of a parsed certificate.
    ///
    /// Serial and subject come from the certificate's own fields, the
    /// signature from the binding extension.
    pub fn from_certificate(cert: &X509Certificate<'_>) -> Result<Self, VerifyError> {
        let ext = find_extension(cert, BINDING_OID).ok_or(VerifyError::MissingBinding)?;
        let subject = subject_common_name(cert).unwrap_or_default();
        Ok(Self {
            serial: cert.tbs_certificate.raw_serial().to_vec(),
            subject,
            signature: ext.value.to_vec(),
        })
    }

    /// Check the signature against `public`.
    pub fn verify<S: Suite>(&self, suite: &S, public: &S::PublicKey) -> Result<(), VerifyError> {
        let message = self
            .message()
            .map_err(|e| VerifyError::Malformed(format!("binding fields: {e}")))?;
        suite
            .verify(public, &message, &self.signature)
            .map_err(|e| VerifyError::BindingSignature(e.to_string()))
    }

    /// The signed message for this binding.
    pub fn message(&self) -> der::Result<Vec<u8>> {
        signed_message(&self.serial, &self.subject)
    }

    /// The binding as a non-critical certificate extension.
    pub fn to_extension(&self) -> CustomExtension {
        let mut ext = CustomExtension::from_oid_content(BINDING_OID, self.signature.clone());
        ext.set_criticality(false);
        ext
    }

    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }
}

/// Encode `DER(INTEGER serial) || DER(PrintableString subject)`.
pub fn signed_message(serial: &[u8], subject: &str) -> der::Result<Vec<u8>> {
    let mut out = Vec::new();
    UintRef::new(serial)?.encode_to_vec(&mut out)?;
    PrintableStringRef::new(subject)?.encode_to_vec(&mut out)?;
    Ok(out)
}

/// Split a signed message back into `(serial, subject)`.
pub fn parse_message(message: &[u8]) -> der::Result<(Vec<u8>, String)> {
    let mut reader = SliceReader::new(message)?;
    let serial = UintRef::decode(&mut reader)?;
    let subject = PrintableStringRef::decode(&mut reader)?;
    let parsed = (serial.as_bytes().to_vec(), subject.as_str().to_owned());
    reader.finish(parsed)
}
