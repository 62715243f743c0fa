//! Key exchange and mailbox, from raw DH arithmetic up to HR opening a
//! leave request.

use num_bigint::BigUint;
use proptest::prelude::*;
use serde_json::json;

use dacguard::crypto::{
    compute_public_key, compute_shared_secret, derive_symmetric_key, CryptoError, DhGroup,
    DhParameters, Initiator, Iv, SymmetricKey,
};
use dacguard::store::Store;
use dacguard::{DecryptFailure, GuardError, SessionState};
use dacguard_testkit::generators::{plaintext, symmetric_key};
use dacguard_testkit::{sample_leave_request, TestFixture, TEXTBOOK};

const LEAVE_JSON: &str = r#"{"reason":"vacation","days":5}"#;

#[test]
fn test_textbook_end_to_end() {
    let t = TEXTBOOK;
    let (p, g) = (BigUint::from(t.p), BigUint::from(t.g));
    let (a, b) = (BigUint::from(t.a), BigUint::from(t.b));

    let employee_public = compute_public_key(&g, &a, &p);
    let server_public = compute_public_key(&g, &b, &p);
    let server_secret = compute_shared_secret(&employee_public, &b, &p);
    let employee_secret = compute_shared_secret(&server_public, &a, &p);
    assert_eq!(server_secret, BigUint::from(t.secret));

    let server_key = SymmetricKey::from_bytes(derive_symmetric_key(&server_secret));
    let sealed = server_key.encrypt_with_iv(LEAVE_JSON.as_bytes(), &Iv([0; 16]));

    let employee_key = SymmetricKey::from_bytes(derive_symmetric_key(&employee_secret));
    let opened = employee_key.decrypt_bytes(&sealed, &Iv([0; 16])).unwrap();
    assert_eq!(String::from_utf8(opened).unwrap(), LEAVE_JSON);
}

#[test]
fn test_full_group_end_to_end() {
    let params = DhParameters::for_group(DhGroup::Modp1536).unwrap();
    let employee = Initiator::new(&params);
    let server_private = params.generate_private_key();
    let server_public = params.public_key(&server_private);
    let server_secret = params
        .shared_secret(employee.public_key(), &server_private)
        .unwrap();

    let sealed = server_secret.derive_symmetric_key().encrypt(LEAVE_JSON);
    let employee_secret = employee.complete(&server_public).unwrap();
    let opened = sealed.decrypt(&employee_secret.derive_symmetric_key()).unwrap();
    assert_eq!(opened, LEAVE_JSON);
}

fn mailbox_round_trip<S: Store>(f: &TestFixture<S>) {
    let employee = f.employee(0);
    assert_eq!(
        f.guard.key_exchange().session_state(f.hr.id).unwrap(),
        SessionState::NoSession
    );

    let request = sample_leave_request();
    let id = f.send_leave(employee, &request);

    let inbox = f.guard.mailbox().inbox(f.hr.id).unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(!inbox[0].ciphertext.contains("vacation"));

    let value = f.guard.mailbox().decrypt(f.hr.id, id).unwrap();
    assert_eq!(value["reason"], json!("vacation"));
    assert_eq!(value["days"], json!(5));

    let inbox = f.guard.mailbox().inbox(f.hr.id).unwrap();
    assert!(inbox[0].read);
}

fn stale_session_is_decryption_error<S: Store>(f: &TestFixture<S>) {
    let (first, second) = (f.employee(0), f.employee(1));
    let id = f.send_leave(first, &sample_leave_request());

    // A second handshake replaces HR's secret.
    f.handshake(second);
    match f.guard.mailbox().decrypt(f.hr.id, id) {
        Err(GuardError::Decryption(_)) => {}
        other => panic!("expected a decryption error, got {other:?}"),
    }

    assert!(!f.guard.mailbox().inbox(f.hr.id).unwrap()[0].read);
}

#[test]
fn test_mailbox_round_trip_memory() {
    mailbox_round_trip(&TestFixture::new());
}

#[test]
fn test_mailbox_round_trip_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    mailbox_round_trip(&TestFixture::sqlite_at(&dir.path().join("guard.db"), 2));
}

#[test]
fn test_stale_session_memory() {
    stale_session_is_decryption_error(&TestFixture::new());
}

#[test]
fn test_stale_session_sqlite() {
    stale_session_is_decryption_error(&TestFixture::sqlite(2));
}

#[test]
fn test_decrypt_without_handshake() {
    let f = TestFixture::new();
    let key = SymmetricKey::generate();
    let sealed = sample_leave_request().seal(&key).unwrap();
    let id = f.guard.mailbox().send(f.employee(0), f.hr.id, &sealed).unwrap();

    assert!(matches!(
        f.guard.mailbox().decrypt(f.hr.id, id),
        Err(GuardError::NotInitialized(_))
    ));
}

#[test]
fn test_respond_without_params() {
    let f = TestFixture::new();
    let params = DhParameters::for_group(DhGroup::Modp1536).unwrap();
    let initiator = Initiator::new(&params);
    assert!(matches!(
        f.guard
            .key_exchange()
            .respond(f.hr.id, f.employee(0), initiator.public_key()),
        Err(GuardError::NotInitialized(_))
    ));
}

#[test]
fn test_key_sensitivity() {
    let params = DhParameters::for_group(DhGroup::Modp1536).unwrap();
    let honest = Initiator::new(&params);
    let other = Initiator::new(&params);
    let server_private = params.generate_private_key();
    let server_public = params.public_key(&server_private);

    let server_key = params
        .shared_secret(honest.public_key(), &server_private)
        .unwrap()
        .derive_symmetric_key();
    let wrong_key = other.complete(&server_public).unwrap().derive_symmetric_key();

    let sealed = server_key.encrypt(LEAVE_JSON);
    assert!(matches!(
        sealed.decrypt(&wrong_key),
        Err(CryptoError::Decryption(
            DecryptFailure::BadPadding | DecryptFailure::BadKey
        ))
    ));
}

#[test]
fn test_iv_uniqueness() {
    let key = SymmetricKey::generate();
    let first = key.encrypt(LEAVE_JSON);
    let second = key.encrypt(LEAVE_JSON);
    assert_ne!(first.iv, second.iv);
    assert_ne!(first.ciphertext, second.ciphertext);
}

proptest! {
    #[test]
    fn test_dh_agreement_small_group(a in 2u32..=21, b in 2u32..=21) {
        let (p, g) = (BigUint::from(23u32), BigUint::from(5u32));
        let (a, b) = (BigUint::from(a), BigUint::from(b));
        let left = compute_shared_secret(&compute_public_key(&g, &b, &p), &a, &p);
        let right = compute_shared_secret(&compute_public_key(&g, &a, &p), &b, &p);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn test_cipher_round_trip(key in symmetric_key(), text in plaintext(256)) {
        let sealed = key.encrypt(&text);
        prop_assert_eq!(sealed.decrypt(&key).unwrap(), text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_dh_agreement_modp1536(_seed in any::<u8>()) {
        let params = DhParameters::for_group(DhGroup::Modp1536).unwrap();
        let a = params.generate_private_key();
        let b = params.generate_private_key();
        let left = params.shared_secret(&params.public_key(&b), &a).unwrap();
        let right = params.shared_secret(&params.public_key(&a), &b).unwrap();
        prop_assert_eq!(left.as_biguint(), right.as_biguint());
    }
}
