//! Error types for the server transport layer.

use keybound_proto::error::ProtoError;
use thiserror::Error;

/// Errors that can occur in the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("endpoint bind failed: {0}")]
    Bind(String),

    #[error("connection accept failed: {0}")]
    Accept(#[from] quinn::ConnectionError),

    #[error("endpoint closed")]
    Closed,

    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
