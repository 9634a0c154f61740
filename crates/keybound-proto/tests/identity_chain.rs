//! Integration tests: end-to-end identity chain.
//!
//! Exercises the full path from identity generation through certificate
//! issuance to peer verification, the same sequence two keybound nodes go
//! through on their first connection.

use std::sync::Arc;

use keybound_proto::binding::{parse_message, signed_message, BINDING_OID};
use keybound_proto::clock::ManualClock;
use keybound_proto::tls::cert_extract::{find_extension, parse_certificate};
use keybound_proto::verifier::verify_peer_chain;
use keybound_proto::{CertificateAuthority, Ed25519Suite, Identity, Suite, VerifyError};

/// Reference epoch: 2025-01-01 00:00:00 UTC.
const JAN_1_2025: i64 = 1735689600;

/// Init tracing subscriber (idempotent across tests via try_init).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

fn authority(clock: &ManualClock) -> CertificateAuthority<Ed25519Suite> {
    CertificateAuthority::with_clock(
        Ed25519Suite,
        Identity::generate(&Ed25519Suite),
        Arc::new(clock.clone()),
    )
}

// ---------------------------------------------------------------------------
// Issue on one node, verify on another
// ---------------------------------------------------------------------------

#[test]
fn certificate_is_accepted_only_for_its_own_key() {
    init_tracing();
    let clock = ManualClock::new(JAN_1_2025);
    let node_a = authority(&clock);
    let node_b = authority(&clock);

    let cert_a = node_a.obtain_certificate().expect("issue A");

    let accepted = verify_peer_chain(
        &Ed25519Suite,
        node_a.identity().public_key(),
        &[cert_a.der()],
        JAN_1_2025,
    )
    .expect("A verifies as A");
    assert_eq!(accepted.subject, node_a.identity().public_key_string());

    let err = verify_peer_chain(
        &Ed25519Suite,
        node_b.identity().public_key(),
        &[cert_a.der()],
        JAN_1_2025,
    )
    .unwrap_err();
    assert!(matches!(err, VerifyError::SubjectMismatch { .. }));
}

#[test]
fn renewed_certificate_still_verifies() {
    init_tracing();
    let clock = ManualClock::new(JAN_1_2025);
    let node = authority(&clock);

    let first = node.obtain_certificate().expect("issue");
    clock.set(first.cache_expires().unix_timestamp());
    let second = node.obtain_certificate().expect("renew");
    assert_ne!(first.der(), second.der());

    verify_peer_chain(
        &Ed25519Suite,
        node.identity().public_key(),
        &[second.der()],
        clock.epoch_secs(),
    )
    .expect("renewed certificate verifies");
}

// ---------------------------------------------------------------------------
// The binding can be rebuilt from the certificate alone
// ---------------------------------------------------------------------------

#[test]
fn binding_is_reproducible_from_certificate_fields() {
    let clock = ManualClock::new(JAN_1_2025);
    let node = authority(&clock);
    let issued = node.obtain_certificate().expect("issue");

    let cert = parse_certificate(issued.der()).expect("parse");
    let serial = cert.tbs_certificate.raw_serial();
    let cn = node.identity().public_key_string();

    let message = signed_message(serial, &cn).expect("encode");
    let (decoded_serial, decoded_cn) = parse_message(&message).expect("decode");
    // The certificate keeps a DER sign byte; the message carries the magnitude.
    assert_eq!(decoded_serial, issued.serial().to_be_bytes());
    assert_eq!(decoded_cn, cn);

    let ext = find_extension(&cert, BINDING_OID).expect("binding extension");
    assert!(!ext.critical);
    Ed25519Suite
        .verify(node.identity().public_key(), &message, ext.value)
        .expect("binding signature over rebuilt message");
}

#[test]
fn identity_survives_private_key_reload() {
    let original = Identity::generate(&Ed25519Suite);
    let bytes = original.private_key().to_bytes();
    let restored =
        Identity::from_private_key(&Ed25519Suite, Ed25519Suite.private_key_from_bytes(&bytes));

    assert_eq!(original.public_key_string(), restored.public_key_string());

    let clock = ManualClock::new(JAN_1_2025);
    let ca = CertificateAuthority::with_clock(Ed25519Suite, restored, Arc::new(clock));
    let issued = ca.obtain_certificate().expect("issue");
    verify_peer_chain(
        &Ed25519Suite,
        original.public_key(),
        &[issued.der()],
        JAN_1_2025,
    )
    .expect("reloaded key issues certificates for the same identity");
}
