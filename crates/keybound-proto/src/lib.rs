//! keybound identity primitives.
//!
//! Shared layer used by both `keybound-client-core` and
//! `keybound-server-core`:
//!
//! - Signature suites and long-term node identities
//! - The per-node certificate authority (issue, cache, renew)
//! - The identity binding carried inside each certificate
//! - Peer certificate verification and its rustls adapters

pub mod authority;
pub mod binding;
pub mod certificate;
pub mod clock;
pub mod error;
pub mod identity;
pub mod serial;
pub mod suite;
pub mod tls;
pub mod verifier;

pub use authority::CertificateAuthority;
pub use certificate::IssuedCertificate;
pub use error::{IssueError, ProtoError, SuiteError, VerifyError};
pub use identity::{Address, ConnType, Identity, ServerIdentity};
pub use suite::{Ed25519Suite, Suite};
