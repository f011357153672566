//! Passphrase key derivation

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

/// Bytes in a derived cipher key (AES-256)
pub const KEY_SIZE: usize = 32;

/// Bytes in a key-derivation salt
pub const SALT_SIZE: usize = 16;

/// PBKDF2 iteration count, fixed by the envelope format
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// Derive a 256-bit cipher key from a passphrase and a per-file salt.
///
/// Deterministic: the same passphrase and salt always yield the same key,
/// which is what lets a download reverse an earlier upload. Each file gets
/// a fresh salt, so two files sealed under one passphrase never share a
/// key. Derivation is total for any non-empty passphrase; callers reject
/// empty passphrases before reaching this stage.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_SIZE]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha1>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}

/// Generate a random key-derivation salt
pub fn generate_salt() -> [u8; SALT_SIZE] {
    use rand::RngExt;
    rand::rng().random()
}
