//! Error types for the keybound protocol crate.
//!
//! Three categories are kept apart so operators can tell "peer is untrusted"
//! from "we could not issue a certificate" from "configuration is wrong":
//!
//! - [`IssueError`]: certificate issuance failed inside the authority.
//! - [`VerifyError`]: a presented certificate failed one of the peer checks.
//! - [`SuiteError`]: the signature primitive rejected a key or signature.
//!
//! [`ProtoError`] wraps all of them for APIs that can fail in several ways.

use thiserror::Error;

/// Errors raised by a [`Suite`](crate::suite::Suite) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiteError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("signature rejected: {0}")]
    Verification(String),
}

/// Errors that can occur while issuing a certificate.
///
/// Issuance never retries internally and never touches the cached
/// certificate when it fails.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to generate certificate keypair: {0}")]
    KeyGeneration(String),

    #[error("failed to sign identity binding: {0}")]
    Binding(#[source] SuiteError),

    #[error("failed to encode identity binding: {0}")]
    Encoding(String),

    #[error("failed to generate X.509 certificate: {0}")]
    CertificateGeneration(String),

    #[error("serial number space exhausted")]
    SerialExhausted,
}

/// Reasons a presented peer certificate is rejected.
///
/// Each variant corresponds to one verification step, see
/// [`VerifyError::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("expected exactly one certificate, got {0}")]
    ChainLength(usize),

    #[error("malformed certificate: {0}")]
    Malformed(String),

    #[error("certificate is not validly self-signed: {0}")]
    SelfSignature(String),

    #[error("certificate not valid before {not_before} (now {now})")]
    NotYetValid { not_before: i64, now: i64 },

    #[error("certificate expired at {not_after} (now {now})")]
    Expired { not_after: i64, now: i64 },

    #[error("certificate structure rejected: {0}")]
    Structure(String),

    #[error("certificate subject {found:?} does not match expected key {expected}")]
    SubjectMismatch { expected: String, found: String },

    #[error("identity binding extension not found")]
    MissingBinding,

    #[error("identity binding signature invalid: {0}")]
    BindingSignature(String),
}

impl VerifyError {
    /// The verification step (1-5) that produced this error.
    pub fn check(&self) -> u8 {
        match self {
            VerifyError::ChainLength(_) => 1,
            VerifyError::Malformed(_)
            | VerifyError::SelfSignature(_)
            | VerifyError::NotYetValid { .. }
            | VerifyError::Expired { .. }
            | VerifyError::Structure(_) => 2,
            VerifyError::SubjectMismatch { .. } => 3,
            VerifyError::MissingBinding => 4,
            VerifyError::BindingSignature(_) => 5,
        }
    }
}

/// Errors that can occur within the `keybound-proto` crate.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("TLS configuration error: {0}")]
    TlsConfiguration(String),

    #[error(transparent)]
    Suite(#[from] SuiteError),

    #[error(transparent)]
    Issue(#[from] IssueError),

    #[error(transparent)]
    Verify(#[from] VerifyError),
}

/// Result type alias using [`ProtoError`].
pub type Result<T> = std::result::Result<T, ProtoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_errors_map_to_checks() {
        assert_eq!(VerifyError::ChainLength(2).check(), 1);
        assert_eq!(VerifyError::Malformed("x".into()).check(), 2);
        assert_eq!(
            VerifyError::Expired {
                not_after: 0,
                now: 1
            }
            .check(),
            2
        );
        assert_eq!(
            VerifyError::SubjectMismatch {
                expected: "a".into(),
                found: "b".into()
            }
            .check(),
            3
        );
        assert_eq!(VerifyError::MissingBinding.check(), 4);
        assert_eq!(VerifyError::BindingSignature("bad".into()).check(), 5);
    }

    #[test]
    fn proto_error_wraps_verify_error_transparently() {
        let err: ProtoError = VerifyError::MissingBinding.into();
        assert_eq!(err.to_string(), "identity binding extension not found");
    }
}
