//! Error types for the client transport layer.

use keybound_proto::error::{ProtoError, VerifyError};
use thiserror::Error;

/// Errors that can occur while dialing a peer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The target address does not use the `tls` connection type.
    #[error("address {0} is not a tls:// address")]
    NotTls(String),

    /// The peer presented a certificate that does not prove the expected
    /// identity. Never retried.
    #[error("peer certificate rejected: {0}")]
    Untrusted(#[source] VerifyError),

    /// Every attempt failed.
    ///
    /// `last` is the final attempt's error and is exposed as `source()`;
    /// callers wanting the specific cause should inspect it there.
    #[error("gave up after {attempts} attempts")]
    Timeout {
        attempts: u32,
        #[source]
        last: Option<Box<ClientError>>,
    },

    #[error("endpoint creation failed: {0}")]
    Endpoint(String),

    #[error("connection failed: {0}")]
    Connection(#[from] quinn::ConnectionError),

    #[error("connect error: {0}")]
    Connect(#[from] quinn::ConnectError),

    #[error("could not resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("failed to extract peer identity: {0}")]
    PeerIdentity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),
}

impl ClientError {
    /// Whether another attempt could succeed.
    ///
    /// Only network-level failures qualify. Trust rejections and local
    /// configuration problems are final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Connection(_) | ClientError::Resolve { .. } | ClientError::Timeout { .. }
        )
    }

    /// The verification failure behind this error, if any.
    pub fn rejection(&self) -> Option<&VerifyError> {
        match self {
            ClientError::Untrusted(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
