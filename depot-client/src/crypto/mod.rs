//! Client-side payload encryption
//!
//! Files can be sealed before upload and opened after download using a key
//! derived from the user's passphrase. The on-wire format is a
//! self-contained envelope (`salt:iv:ciphertext`); opening one needs only
//! the envelope text and the passphrase, never out-of-band state.
//!
//! The parameters (PBKDF2 over SHA-1 at 1000 iterations, AES-256-CBC with
//! PKCS#7 padding, hex salt and IV, base64 ciphertext) are fixed by the
//! existing envelope format and cannot change without breaking files
//! already stored by the web client.

mod cipher;
mod envelope;
mod keys;

pub use cipher::{IV_SIZE, decrypt, encrypt, generate_iv};
pub use envelope::EncryptionEnvelope;
pub use keys::{KEY_SIZE, PBKDF2_ITERATIONS, SALT_SIZE, derive_key, generate_salt};

/// Errors from the encryption pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption could not produce ciphertext
    EncryptionFailed,
    /// Key/IV/ciphertext mismatch; also covers a wrong passphrase
    DecryptionFailed,
    /// Envelope text is not `salt:iv:ciphertext` with valid fields
    InvalidEnvelope,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::EncryptionFailed => write!(f, "encryption failed"),
            CryptoError::DecryptionFailed => write!(f, "decryption failed"),
            CryptoError::InvalidEnvelope => write!(f, "invalid encryption envelope"),
        }
    }
}

impl std::error::Error for CryptoError {}
