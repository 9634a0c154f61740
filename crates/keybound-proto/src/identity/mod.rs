//! Node identity: the long-term keypair and what peers know about it.
//!
//! An [`Identity`] is the keypair a node generates once and keeps for its
//! whole life. Its public key, rendered as a string, is the node's name: it is
//! written into every certificate the node issues and is what a peer expects
//! when dialing. A [`ServerIdentity`] is the public half plus a reachable
//! address, i.e. what one node needs in order to connect to another.

pub mod address;

use std::fmt;

use crate::suite::Suite;

pub use address::{Address, ConnType};

/// A node's long-term identity keypair.
pub struct Identity<S: Suite> {
    private: S::PrivateKey,
    public: S::PublicKey,
}

impl<S: Suite> Identity<S> {
    /// Generate a new identity using the suite's CSPRNG.
    pub fn generate(suite: &S) -> Self {
        Self::from_private_key(suite, suite.generate_private_key())
    }

    /// Wrap an existing private key (e.g. loaded from disk).
    pub fn from_private_key(suite: &S, private: S::PrivateKey) -> Self {
        let public = suite.public_key(&private);
        Self { private, public }
    }

    pub fn public_key(&self) -> &S::PublicKey {
        &self.public
    }

    /// The private key. Only the certificate authority should need this.
    pub fn private_key(&self) -> &S::PrivateKey {
        &self.private
    }

    /// Canonical string form of the public key.
    pub fn public_key_string(&self) -> String {
        self.public.to_string()
    }

    /// Describe this node to peers reachable at `address`.
    pub fn server_identity(&self, address: Address) -> ServerIdentity<S> {
        ServerIdentity::new(self.public.clone(), address)
    }
}

impl<S: Suite> fmt::Debug for Identity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// A peer's public identity and where to reach it.
#[derive(Debug, Clone)]
pub struct ServerIdentity<S: Suite> {
    public: S::PublicKey,
    address: Address,
}

impl<S: Suite> ServerIdentity<S> {
    pub fn new(public: S::PublicKey, address: Address) -> Self {
        Self { public, address }
    }

    pub fn public_key(&self) -> &S::PublicKey {
        &self.public
    }

    pub fn address(&self) -> &Address {
        &self.address
    }
}
