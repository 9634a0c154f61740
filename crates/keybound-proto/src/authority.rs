//! Per-node certificate authority: issues, caches and renews the node's
//! identity certificate.
//!
//! The authority is the only holder of the node's long-term private key. On a
//! cache miss it bumps its serial counter, signs a [`SignedBinding`] over the
//! new serial and the node's public-key string, and self-signs a fresh
//! certificate around it (see [`crate::certificate`]). The certificate is
//! served until one hour before its stated expiry; the next request after
//! that regenerates it.
//!
//! Expiry is checked lazily on each request. There is no background timer.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::binding::SignedBinding;
use crate::certificate::{CertificateTemplate, IssuedCertificate};
use crate::clock::{Clock, SystemClock};
use crate::error::IssueError;
use crate::identity::Identity;
use crate::serial::SerialNumber;
use crate::suite::Suite;

struct AuthorityState {
    /// Last serial handed out, including ones whose issuance failed.
    serial: SerialNumber,
    cached: Option<Arc<IssuedCertificate>>,
}

/// Issues and caches self-signed identity certificates for one node.
pub struct CertificateAuthority<S: Suite> {
    suite: S,
    identity: Identity<S>,
    clock: Arc<dyn Clock>,
    state: Mutex<AuthorityState>,
}

impl<S: Suite> CertificateAuthority<S> {
    /// Create an authority for `identity` using wall-clock time.
    pub fn new(suite: S, identity: Identity<S>) -> Self {
        Self::with_clock(suite, identity, Arc::new(SystemClock))
    }

    /// Create an authority reading time from `clock`.
    pub fn with_clock(suite: S, identity: Identity<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            suite,
            identity,
            clock,
            state: Mutex::new(AuthorityState {
                serial: SerialNumber::random(),
                cached: None,
            }),
        }
    }

    /// Return the current certificate, issuing a new one if the cached one is
    /// missing or inside the expiry margin.
    ///
    /// Concurrent callers during a cache miss wait for a single regeneration
    /// and all receive its result. On error the cache is left as it was, but
    /// the serial stays spent: the next issuance never reuses it.
    pub fn obtain_certificate(&self) -> Result<Arc<IssuedCertificate>, IssueError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();

        if let Some(cached) = &state.cached {
            if cached.is_fresh_at(now) {
                return Ok(Arc::clone(cached));
            }
        }

        let serial = state.serial.next().ok_or(IssueError::SerialExhausted)?;
        state.serial = serial;

        let subject = self.identity.public_key_string();
        let binding =
            SignedBinding::sign(&self.suite, self.identity.private_key(), serial, &subject)?;
        let issued = Arc::new(IssuedCertificate::self_sign(CertificateTemplate {
            serial,
            subject: &subject,
            binding: Some(&binding),
            now,
        })?);

        debug!(
            suite = self.suite.name(),
            %serial,
            not_after = %issued.not_after(),
            cache_expires = %issued.cache_expires(),
            "issued identity certificate"
        );

        state.cached = Some(Arc::clone(&issued));
        Ok(issued)
    }

    /// The cached certificate, without checking expiry or issuing.
    pub fn current(&self) -> Option<Arc<IssuedCertificate>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cached
            .clone()
    }

    pub fn identity(&self) -> &Identity<S> {
        &self.identity
    }

    pub fn suite(&self) -> &S {
        &self.suite
    }
}

impl<S: Suite> std::fmt::Debug for CertificateAuthority<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("suite", &self.suite)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::SuiteError;
    use crate::suite::Ed25519Suite;

    /// Reference epoch: 2025-01-01 00:00:00 UTC.
    const JAN_1_2025: i64 = 1735689600;

    /// Ed25519 whose signing can be switched off.
    #[derive(Debug, Clone)]
    struct FlakySuite {
        fail: Arc<AtomicBool>,
    }

    impl Suite for FlakySuite {
        type PublicKey = <Ed25519Suite as Suite>::PublicKey;
        type PrivateKey = <Ed25519Suite as Suite>::PrivateKey;

        fn name(&self) -> &'static str {
            "flaky"
        }

        fn generate_private_key(&self) -> Self::PrivateKey {
            Ed25519Suite.generate_private_key()
        }

        fn public_key(&self, private: &Self::PrivateKey) -> Self::PublicKey {
            Ed25519Suite.public_key(private)
        }

        fn parse_public_key(&self, s: &str) -> Result<Self::PublicKey, SuiteError> {
            Ed25519Suite.parse_public_key(s)
        }

        fn sign(&self, private: &Self::PrivateKey, message: &[u8]) -> Result<Vec<u8>, SuiteError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SuiteError::Signing("switched off".into()));
            }
            Ed25519Suite.sign(private, message)
        }

        fn verify(
            &self,
            public: &Self::PublicKey,
            message: &[u8],
            signature: &[u8],
        ) -> Result<(), SuiteError> {
            Ed25519Suite.verify(public, message, signature)
        }
    }

    fn authority_at(epoch: i64) -> (CertificateAuthority<Ed25519Suite>, ManualClock) {
        let clock = ManualClock::new(epoch);
        let identity = Identity::generate(&Ed25519Suite);
        let ca = CertificateAuthority::with_clock(Ed25519Suite, identity, Arc::new(clock.clone()));
        (ca, clock)
    }

    #[test]
    fn first_request_issues_certificate() {
        let (ca, _clock) = authority_at(JAN_1_2025);
        assert!(ca.current().is_none());

        let cert = ca.obtain_certificate().expect("issue");
        assert_eq!(cert.leaf().subject, ca.identity().public_key_string());
        assert!(ca.current().is_some());
    }

    #[test]
    fn cached_certificate_is_byte_identical() {
        let (ca, clock) = authority_at(JAN_1_2025);
        let first = ca.obtain_certificate().expect("issue");

        clock.advance(Duration::from_secs(12 * 3600));
        let second = ca.obtain_certificate().expect("cached");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.der(), second.der());
    }

    #[test]
    fn renews_after_cache_margin_with_next_serial() {
        let (ca, clock) = authority_at(JAN_1_2025);
        let first = ca.obtain_certificate().expect("issue");

        // One second before the cache expiry: still served.
        clock.set(first.cache_expires().unix_timestamp() - 1);
        assert!(Arc::ptr_eq(&first, &ca.obtain_certificate().expect("cached")));

        // At not_after - 1h: regenerated.
        clock.set(first.not_after().unix_timestamp() - 3600);
        let second = ca.obtain_certificate().expect("renew");

        assert_ne!(first.der(), second.der());
        assert_eq!(second.serial().value(), first.serial().value() + 1);
        assert_ne!(
            first.ephemeral_public_key_der(),
            second.ephemeral_public_key_der()
        );
    }

    #[test]
    fn serials_strictly_increase_across_renewals() {
        let (ca, clock) = authority_at(JAN_1_2025);
        let mut serials = Vec::new();
        for _ in 0..8 {
            let cert = ca.obtain_certificate().expect("issue");
            serials.push(cert.serial());
            clock.set(cert.not_after().unix_timestamp());
        }
        for pair in serials.windows(2) {
            assert_eq!(pair[1].value(), pair[0].value() + 1);
        }
    }

    #[test]
    fn concurrent_cache_miss_regenerates_once() {
        let (ca, _clock) = authority_at(JAN_1_2025);
        let barrier = Barrier::new(8);

        let certs: Vec<Arc<IssuedCertificate>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        ca.obtain_certificate().expect("issue")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("join")).collect()
        });

        for cert in &certs[1..] {
            assert!(Arc::ptr_eq(&certs[0], cert));
        }
        // A second regeneration would have moved the serial on.
        let current = ca.current().expect("cached");
        assert_eq!(current.serial(), certs[0].serial());
    }

    #[test]
    fn failed_issuance_leaves_cache_untouched() {
        let fail = Arc::new(AtomicBool::new(false));
        let suite = FlakySuite { fail: fail.clone() };
        let clock = ManualClock::new(JAN_1_2025);
        let identity = Identity::generate(&suite);
        let ca = CertificateAuthority::with_clock(suite, identity, Arc::new(clock.clone()));

        let first = ca.obtain_certificate().expect("issue");

        clock.set(first.not_after().unix_timestamp());
        fail.store(true, Ordering::SeqCst);
        let err = ca.obtain_certificate().unwrap_err();
        assert!(matches!(err, IssueError::Binding(SuiteError::Signing(_))));
        assert!(Arc::ptr_eq(&first, &ca.current().expect("still cached")));

        // The failed attempt spent a serial; recovery moves past it.
        fail.store(false, Ordering::SeqCst);
        let second = ca.obtain_certificate().expect("issue");
        assert_eq!(second.serial().value(), first.serial().value() + 2);
    }

    #[test]
    fn failure_on_first_request_leaves_cache_empty() {
        let suite = FlakySuite {
            fail: Arc::new(AtomicBool::new(true)),
        };
        let identity = Identity::generate(&suite);
        let ca = CertificateAuthority::new(suite, identity);

        assert!(ca.obtain_certificate().is_err());
        assert!(ca.current().is_none());
    }
}
