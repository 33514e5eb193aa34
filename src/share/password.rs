use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

// Iteration count sized to cost >10ms on commodity hardware.
const PBKDF2_ROUNDS: u32 = 120_000;
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;

/// Derived share-password material, hex encoded for storage.
#[derive(Debug, Clone)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

/// Derives storable hash material for a share password with a fresh
/// random salt.
#[must_use]
pub fn hash_password(password: &str) -> PasswordHash {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);

    let mut derived = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut derived);

    PasswordHash {
        hash: hex::encode(derived),
        salt: hex::encode(salt),
    }
}

/// Checks a supplied password against stored hash material.
///
/// Malformed stored values (bad hex, wrong length) never match; the
/// derived output is compared without early exit.
#[must_use]
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    let Ok(expected) = hex::decode(hash) else {
        return false;
    };
    if salt.is_empty() || expected.len() != HASH_BYTES {
        return false;
    }

    let mut derived = [0u8; HASH_BYTES];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ROUNDS, &mut derived);

    derived.as_slice().ct_eq(&expected).into()
}
