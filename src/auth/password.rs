use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

/// One-way hash with a per-call random salt. The salt travels inside the
/// PHC string, so `verify_password` needs nothing but the stored hash.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Constant-time verification (argon2 recomputes with the embedded salt
/// and compares internally). Errors only on a malformed stored hash.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "secret1";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("secret1").expect("hashing should succeed");
        assert!(!verify_password("wrong", &hash).expect("verify should not error"));
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = "correct-horse-battery-staple";
        let h1 = hash_password(password).expect("hash 1");
        let h2 = hash_password(password).expect("hash 2");
        assert_ne!(h1, h2, "salts must differ per call");
        assert!(verify_password(password, &h1).expect("verify h1"));
        assert!(verify_password(password, &h2).expect("verify h2"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn stored_hash_never_contains_plaintext() {
        let hash = hash_password("hunter2hunter2").expect("hash");
        assert!(!hash.contains("hunter2"));
        assert!(hash.starts_with("$argon2"));
    }
}
