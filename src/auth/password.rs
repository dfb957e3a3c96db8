use rand::Rng;
use sha2::Sha256;

use crate::error::{Error, Result};

const SALT_BYTES: usize = 32;
const PBKDF2_ITERATIONS: u32 = 1000;
const KEY_BYTES: usize = 32;

/// Salt and derived key as stored on a user document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecuredPassword {
    pub salt: Vec<u8>,
    pub key: Vec<u8>,
}

impl SecuredPassword {
    #[must_use]
    pub fn salt_hex(&self) -> String {
        hex::encode(&self.salt)
    }

    #[must_use]
    pub fn key_hex(&self) -> String {
        hex::encode(&self.key)
    }

    /// Rebuilds a stored pair from its hex encoding.
    pub fn from_hex(salt: &str, key: &str) -> Result<Self> {
        let salt = hex::decode(salt).map_err(|e| Error::Malformed(format!("invalid salt: {e}")))?;
        let key = hex::decode(key)
            .map_err(|e| Error::Malformed(format!("invalid secured password: {e}")))?;
        Ok(Self { salt, key })
    }
}

/// PBKDF2-HMAC-SHA256 password hashing with a random 32-byte salt.
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Derives a key for `password` under a freshly generated salt.
    #[must_use]
    pub fn secure(&self, password: &str) -> SecuredPassword {
        let salt = generate_salt();
        let key = derive_key(password, &salt, self.iterations);
        SecuredPassword {
            salt: salt.to_vec(),
            key: key.to_vec(),
        }
    }

    /// Re-derives the key under the stored salt and compares in constant time.
    #[must_use]
    pub fn verify(&self, password: &str, stored: &SecuredPassword) -> bool {
        let key = derive_key(password, &stored.salt, self.iterations);
        constant_time_eq(&key, &stored.key)
    }
}

fn generate_salt() -> [u8; SALT_BYTES] {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill(&mut salt);
    salt
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_BYTES] {
    pbkdf2::pbkdf2_hmac_array::<Sha256, KEY_BYTES>(password.as_bytes(), salt, iterations)
}

/// Constant-time comparison for credential checks.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pbkdf2_vectors() {
        let one = derive_key("password", b"salt", 1);
        assert_eq!(
            hex::encode(one),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        let many = derive_key("password", b"salt", 4096);
        assert_eq!(
            hex::encode(many),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn test_secure_shapes() {
        let hasher = PasswordHasher::new();
        let secured = hasher.secure("hunter2");
        assert_eq!(secured.salt.len(), 32);
        assert_eq!(secured.key.len(), 32);
        assert_ne!(secured.key, b"hunter2".to_vec());
    }

    #[test]
    fn test_verify_correct_and_wrong() {
        let hasher = PasswordHasher::new();
        let secured = hasher.secure("correct horse");

        assert!(hasher.verify("correct horse", &secured));
        assert!(!hasher.verify("correct horsE", &secured));
        assert!(!hasher.verify("", &secured));
    }

    #[test]
    fn test_same_password_gets_fresh_salt() {
        let hasher = PasswordHasher::new();
        let a = hasher.secure("same");
        let b = hasher.secure("same");

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_hex_round_trip_verifies() {
        let hasher = PasswordHasher::new();
        let secured = hasher.secure("pw");
        let restored = SecuredPassword::from_hex(&secured.salt_hex(), &secured.key_hex()).unwrap();
        assert!(hasher.verify("pw", &restored));

        assert!(matches!(
            SecuredPassword::from_hex("zz", "00"),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
    }
}
