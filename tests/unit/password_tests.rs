// ============================
// tests/unit/password_tests.rs
// ============================
//! Password hashing through the public hasher API
use backend_lib::auth::{generate_salt, HashAlgorithm, PasswordHasher};

fn hasher(algorithm: HashAlgorithm) -> PasswordHasher {
    PasswordHasher::new(algorithm, 4, 4).unwrap()
}

#[test]
fn test_hash_and_verify_both_algorithms() {
    for algorithm in [HashAlgorithm::Bcrypt, HashAlgorithm::Scrypt] {
        let hasher = hasher(algorithm);
        let salt = generate_salt(16).unwrap();
        let digest = hasher.hash("pw123", &salt).unwrap();

        assert_eq!(digest.algorithm, algorithm);
        assert_ne!(digest.hash, "pw123");
        assert!(hasher.verify(&digest.hash, algorithm, &salt, "pw123"));
        assert!(!hasher.verify(&digest.hash, algorithm, &salt, "pw124"));
    }
}

#[test]
fn test_salt_is_part_of_the_input() {
    let hasher = hasher(HashAlgorithm::Bcrypt);
    let salt = generate_salt(16).unwrap();
    let other_salt = generate_salt(16).unwrap();
    assert_ne!(salt, other_salt);

    let digest = hasher.hash("pw123", &salt).unwrap();
    assert!(!hasher.verify(&digest.hash, HashAlgorithm::Bcrypt, &other_salt, "pw123"));
}

#[test]
fn test_records_verify_with_their_own_algorithm() {
    // A bcrypt hasher still verifies records written under scrypt
    let scrypt = hasher(HashAlgorithm::Scrypt);
    let bcrypt = hasher(HashAlgorithm::Bcrypt);
    let salt = generate_salt(16).unwrap();
    let digest = scrypt.hash("pw123", &salt).unwrap();

    assert!(bcrypt.verify(&digest.hash, HashAlgorithm::Scrypt, &salt, "pw123"));
    assert!(!bcrypt.verify(&digest.hash, HashAlgorithm::Bcrypt, &salt, "pw123"));
}

#[test]
fn test_hasher_rejects_bad_parameters() {
    assert!(PasswordHasher::new(HashAlgorithm::Bcrypt, 3, 4).is_err());
    assert!(PasswordHasher::new(HashAlgorithm::Bcrypt, 32, 4).is_err());
}

#[tokio::test]
async fn test_blocking_variants_match() {
    let hasher = hasher(HashAlgorithm::Bcrypt);
    let salt = generate_salt(16).unwrap();
    let digest = hasher
        .hash_blocking("pw123".to_string(), salt.clone())
        .await
        .unwrap();

    assert!(
        hasher
            .verify_blocking(digest.hash.clone(), digest.algorithm, salt.clone(), "pw123".to_string())
            .await
    );
    assert!(
        !hasher
            .verify_blocking(digest.hash, digest.algorithm, salt, "nope".to_string())
            .await
    );
}
