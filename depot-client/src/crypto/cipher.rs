//! AES-256-CBC with PKCS#7 padding

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use super::CryptoError;
use super::keys::KEY_SIZE;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Bytes in an initialization vector (one AES block)
pub const IV_SIZE: usize = 16;

const BLOCK_SIZE: usize = 16;

/// Encrypt a buffer. Deterministic given (key, iv, plaintext); fresh IVs
/// make repeated encryptions of the same bytes unlinkable.
///
/// Output length is the plaintext length rounded up to the next whole
/// block (PKCS#7 always pads, so empty input yields one block).
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    let encryptor =
        Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| CryptoError::EncryptionFailed)?;

    let padding = BLOCK_SIZE - (plaintext.len() % BLOCK_SIZE);
    let mut buf = vec![0u8; plaintext.len() + padding];
    buf[..plaintext.len()].copy_from_slice(plaintext);

    let written = encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .map_err(|_| CryptoError::EncryptionFailed)?
        .len();
    buf.truncate(written);

    Ok(buf)
}

/// Decrypt a buffer, returning the exact original bytes.
///
/// Fails with [`CryptoError::DecryptionFailed`] on any key/IV/ciphertext
/// mismatch. A wrong passphrase surfaces the same way; the cipher layer
/// cannot tell the cases apart and must not try (padding-oracle hygiene).
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let decryptor =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| CryptoError::DecryptionFailed)?;

    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    Ok(plaintext.to_vec())
}

/// Generate a random initialization vector
pub fn generate_iv() -> [u8; IV_SIZE] {
    use rand::RngExt;
    rand::rng().random()
}
