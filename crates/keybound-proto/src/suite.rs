//! Signature suites: the sign/verify primitive behind identity bindings.
//!
//! A [`Suite`] bundles a key type with its signature scheme. The certificate
//! authority and the peer verifier are generic over it; nothing in the core
//! assumes a particular group.
//!
//! [`Ed25519Suite`] is the shipped implementation, delegating to
//! `ed25519-dalek` (MIT/Apache-2.0)
//! <https://github.com/dalek-cryptography/curve25519-dalek>

use std::fmt;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::SuiteError;

/// A signature scheme over some cryptographic group.
///
/// The `Display` rendering of [`Suite::PublicKey`] is the canonical string
/// form of a node's identity: it becomes the certificate subject and is what
/// verifiers compare against.
pub trait Suite: fmt::Debug + Clone + Send + Sync + 'static {
    /// Long-term public key.
    type PublicKey: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Long-term private key.
    type PrivateKey: Send + Sync + 'static;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Generate a fresh private key from the OS CSPRNG.
    fn generate_private_key(&self) -> Self::PrivateKey;

    /// Derive the public key belonging to `private`.
    fn public_key(&self, private: &Self::PrivateKey) -> Self::PublicKey;

    /// Parse a public key from its canonical string form.
    fn parse_public_key(&self, s: &str) -> Result<Self::PublicKey, SuiteError>;

    /// Sign `message` with `private`.
    fn sign(&self, private: &Self::PrivateKey, message: &[u8]) -> Result<Vec<u8>, SuiteError>;

    /// Verify `signature` over `message` against `public`.
    fn verify(
        &self,
        public: &Self::PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SuiteError>;
}

/// Ed25519 signatures (RFC 8032).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Suite;

impl Ed25519Suite {
    /// Reconstruct a private key from its 32-byte secret.
    ///
    /// Used when loading a persisted identity from disk.
    pub fn private_key_from_bytes(&self, bytes: &[u8; 32]) -> SigningKey {
        SigningKey::from_bytes(bytes)
    }
}

/// An Ed25519 public key, displayed as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519PublicKey(VerifyingKey);

impl Ed25519PublicKey {
    /// Returns the raw 32-byte public key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Parse a raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SuiteError> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| SuiteError::InvalidKey(e.to_string()))
    }
}

impl fmt::Display for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HEXLOWER.encode(self.0.as_bytes()))
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey({self})")
    }
}

impl Suite for Ed25519Suite {
    type PublicKey = Ed25519PublicKey;
    // Zeroized on drop by ed25519-dalek.
    type PrivateKey = SigningKey;

    fn name(&self) -> &'static str {
        "Ed25519"
    }

    fn generate_private_key(&self) -> SigningKey {
        SigningKey::generate(&mut OsRng)
    }

    fn public_key(&self, private: &SigningKey) -> Ed25519PublicKey {
        Ed25519PublicKey(private.verifying_key())
    }

    fn parse_public_key(&self, s: &str) -> Result<Ed25519PublicKey, SuiteError> {
        let bytes = HEXLOWER_PERMISSIVE
            .decode(s.as_bytes())
            .map_err(|e| SuiteError::InvalidKey(format!("hex decode: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            SuiteError::InvalidKey(format!("expected 32-byte key, got {} bytes", v.len()))
        })?;
        Ed25519PublicKey::from_bytes(&bytes)
    }

    fn sign(&self, private: &SigningKey, message: &[u8]) -> Result<Vec<u8>, SuiteError> {
        Ok(private.sign(message).to_bytes().to_vec())
    }

    fn verify(
        &self,
        public: &Ed25519PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SuiteError> {
        let signature = Signature::from_slice(signature)
            .map_err(|e| SuiteError::Verification(format!("malformed signature: {e}")))?;
        public
            .0
            .verify(message, &signature)
            .map_err(|e| SuiteError::Verification(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let suite = Ed25519Suite;
        let private = suite.generate_private_key();
        let public = suite.public_key(&private);

        let sig = suite.sign(&private, b"hello").expect("sign");
        assert!(suite.verify(&public, b"hello", &sig).is_ok());
    }

    #[test]
    fn verify_rejects_other_message() {
        let suite = Ed25519Suite;
        let private = suite.generate_private_key();
        let public = suite.public_key(&private);

        let sig = suite.sign(&private, b"hello").expect("sign");
        assert!(suite.verify(&public, b"hellp", &sig).is_err());
    }

    #[test]
    fn verify_rejects_other_key() {
        let suite = Ed25519Suite;
        let a = suite.generate_private_key();
        let b = suite.generate_private_key();

        let sig = suite.sign(&a, b"hello").expect("sign");
        assert!(suite.verify(&suite.public_key(&b), b"hello", &sig).is_err());
    }

    #[test]
    fn verify_rejects_truncated_signature() {
        let suite = Ed25519Suite;
        let private = suite.generate_private_key();
        let sig = suite.sign(&private, b"hello").expect("sign");
        let result = suite.verify(&suite.public_key(&private), b"hello", &sig[..10]);
        assert!(matches!(result, Err(SuiteError::Verification(_))));
    }

    #[test]
    fn public_key_string_roundtrip() {
        let suite = Ed25519Suite;
        let public = suite.public_key(&suite.generate_private_key());
        let s = public.to_string();

        assert_eq!(s.len(), 64);
        assert_eq!(suite.parse_public_key(&s).expect("parse"), public);
        assert_eq!(
            suite.parse_public_key(&s.to_uppercase()).expect("parse"),
            public
        );
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let result = Ed25519Suite.parse_public_key("abcd");
        assert!(matches!(result, Err(SuiteError::InvalidKey(_))));
    }

    #[test]
    fn secret_bytes_roundtrip() {
        let suite = Ed25519Suite;
        let original = suite.generate_private_key();
        let restored = suite.private_key_from_bytes(&original.to_bytes());
        assert_eq!(suite.public_key(&original), suite.public_key(&restored));
    }
}
