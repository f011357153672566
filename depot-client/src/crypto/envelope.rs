//! The `salt:iv:ciphertext` envelope
//!
//! One envelope is one encrypted file payload: PBKDF2 salt in hex, AES IV
//! in hex, ciphertext in base64, joined with colons. An envelope is born at
//! upload time, stored verbatim on the server, and consumed exactly once by
//! the matching download; it is never mutated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::CryptoError;
use super::cipher::{IV_SIZE, decrypt, encrypt, generate_iv};
use super::keys::{SALT_SIZE, derive_key, generate_salt};

/// A parsed encrypted-file payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    pub salt: [u8; SALT_SIZE],
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
}

impl EncryptionEnvelope {
    /// Encrypt plaintext under a passphrase with a fresh salt and IV
    pub fn seal(plaintext: &[u8], passphrase: &str) -> Result<Self, CryptoError> {
        let salt = generate_salt();
        let iv = generate_iv();
        let key = derive_key(passphrase, &salt);
        let ciphertext = encrypt(plaintext, &key, &iv)?;

        Ok(Self {
            salt,
            iv,
            ciphertext,
        })
    }

    /// Recover the plaintext.
    ///
    /// Self-contained: the envelope plus the passphrase are sufficient, no
    /// out-of-band state. A wrong passphrase surfaces as
    /// [`CryptoError::DecryptionFailed`].
    pub fn open(&self, passphrase: &str) -> Result<Vec<u8>, CryptoError> {
        let key = derive_key(passphrase, &self.salt);
        decrypt(&self.ciphertext, &key, &self.iv)
    }

    /// Render the wire form: `hex(salt):hex(iv):base64(ciphertext)`
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}",
            hex::encode(self.salt),
            hex::encode(self.iv),
            BASE64.encode(&self.ciphertext)
        )
    }

    /// Parse the wire form.
    ///
    /// Requires exactly three colon-separated fields with valid hex salt
    /// and IV of the fixed sizes and non-empty base64 ciphertext; anything
    /// else is [`CryptoError::InvalidEnvelope`].
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        if parts.len() != 3 {
            return Err(CryptoError::InvalidEnvelope);
        }

        let salt: [u8; SALT_SIZE] = hex::decode(parts[0])
            .map_err(|_| CryptoError::InvalidEnvelope)?
            .try_into()
            .map_err(|_| CryptoError::InvalidEnvelope)?;
        let iv: [u8; IV_SIZE] = hex::decode(parts[1])
            .map_err(|_| CryptoError::InvalidEnvelope)?
            .try_into()
            .map_err(|_| CryptoError::InvalidEnvelope)?;
        let ciphertext = BASE64
            .decode(parts[2])
            .map_err(|_| CryptoError::InvalidEnvelope)?;

        // A real envelope always carries at least one cipher block
        if ciphertext.is_empty() {
            return Err(CryptoError::InvalidEnvelope);
        }

        Ok(Self {
            salt,
            iv,
            ciphertext,
        })
    }
}
