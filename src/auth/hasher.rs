//! Password hashing compatible with the retired terminal-management system.
//!
//! Stored credentials predate this codebase and use a salted SHA1 digest:
//! `sha1(salt || sha1(password) || sha1(salt))` with every SHA1 output
//! hex-encoded before the outer digest. The concatenation order is a
//! compatibility contract; changing it invalidates every stored credential.
//! Modern hashes (bcrypt, Argon2) are detected by prefix and verified with
//! their native algorithms so both generations of users can log in.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Output of [`LegacyHasher::hash`]. The salt is returned to the caller and
/// must be persisted alongside the hash; it is never embedded in the hash
/// string itself.
#[derive(Debug, Clone)]
pub struct HashedPassword {
    pub hash: String,
    pub salt: String,
}

pub struct LegacyHasher;

impl LegacyHasher {
    /// Hashes a password with a freshly generated random salt.
    #[must_use]
    pub fn hash(password: &str) -> HashedPassword {
        let salt = generate_salt();
        let hash = Self::hash_with_salt(password, &salt);
        HashedPassword { hash, salt }
    }

    /// Recomputes the legacy digest for a known salt.
    #[must_use]
    pub fn hash_with_salt(password: &str, salt: &str) -> String {
        let inner = format!("{salt}{}{}", sha1_hex(password.as_bytes()), sha1_hex(salt.as_bytes()));
        sha1_hex(inner.as_bytes())
    }

    /// Verifies a password against a stored hash.
    ///
    /// Modern hash formats are recognized by their algorithm-identifier
    /// prefixes and verified natively; anything else is treated as a legacy
    /// digest and compared in constant time. Never fails with an error: a
    /// malformed stored hash simply does not verify.
    #[must_use]
    pub fn verify(password: &str, stored_hash: &str, salt: &str) -> bool {
        if stored_hash.is_empty() {
            return false;
        }

        if is_bcrypt(stored_hash) {
            return bcrypt::verify(password, stored_hash).unwrap_or(false);
        }

        if stored_hash.starts_with("$argon2") {
            return PasswordHash::new(stored_hash)
                .map(|parsed| {
                    Argon2::default()
                        .verify_password(password.as_bytes(), &parsed)
                        .is_ok()
                })
                .unwrap_or(false);
        }

        let computed = Self::hash_with_salt(password, salt);
        computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
    }

    /// Legacy hashes are never upgraded in place; there is no automatic
    /// migration path off the retired algorithm.
    #[must_use]
    pub const fn needs_rehash(_stored_hash: &str) -> bool {
        false
    }
}

fn is_bcrypt(hash: &str) -> bool {
    hash.starts_with("$2a$")
        || hash.starts_with("$2b$")
        || hash.starts_with("$2x$")
        || hash.starts_with("$2y$")
}

fn sha1_hex(data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    digest.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Generate a random salt (16 bytes from the OS, hex-encoded to 32 chars).
#[must_use]
pub fn generate_salt() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();

    bytes.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_known_vectors() {
        assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            sha1_hex(b"password"),
            "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8"
        );
    }

    #[test]
    fn legacy_hash_is_deterministic_and_ordered() {
        let salt = "00112233445566778899aabbccddeeff";
        let once = LegacyHasher::hash_with_salt("secret", salt);
        let twice = LegacyHasher::hash_with_salt("secret", salt);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 40);

        // The exact inner concatenation: salt, sha1(password) hex, sha1(salt) hex.
        let expected = sha1_hex(
            format!("{salt}{}{}", sha1_hex(b"secret"), sha1_hex(salt.as_bytes())).as_bytes(),
        );
        assert_eq!(once, expected);
    }

    #[test]
    fn round_trip_verifies() {
        let hashed = LegacyHasher::hash("hunter2");
        assert_eq!(hashed.salt.len(), 32);
        assert!(LegacyHasher::verify("hunter2", &hashed.hash, &hashed.salt));
        assert!(!LegacyHasher::verify("hunter3", &hashed.hash, &hashed.salt));
    }

    #[test]
    fn empty_stored_hash_never_verifies() {
        assert!(!LegacyHasher::verify("anything", "", "somesalt"));
        assert!(!LegacyHasher::verify("", "", ""));
    }

    #[test]
    fn salts_are_unique_per_hash() {
        let a = LegacyHasher::hash("same-password");
        let b = LegacyHasher::hash("same-password");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn bcrypt_hashes_are_detected_and_verified() {
        let hash = bcrypt::hash("modern-pw", 4).unwrap();
        assert!(LegacyHasher::verify("modern-pw", &hash, ""));
        assert!(!LegacyHasher::verify("wrong-pw", &hash, ""));
    }

    #[test]
    fn argon2_hashes_are_detected_and_verified() {
        use argon2::password_hash::{PasswordHasher, SaltString};
        use rand::Rng;

        let bytes: [u8; 16] = rand::rng().random();
        let salt = SaltString::encode_b64(&bytes).unwrap();
        let hash = Argon2::default()
            .hash_password(b"modern-pw", &salt)
            .unwrap()
            .to_string();
        assert!(LegacyHasher::verify("modern-pw", &hash, ""));
        assert!(!LegacyHasher::verify("wrong-pw", &hash, ""));
    }

    #[test]
    fn malformed_modern_hash_fails_closed() {
        assert!(!LegacyHasher::verify("pw", "$argon2id$not-a-real-hash", ""));
    }

    #[test]
    fn legacy_hashes_never_need_rehash() {
        let hashed = LegacyHasher::hash("pw");
        assert!(!LegacyHasher::needs_rehash(&hashed.hash));
    }
}
