//! ChaCha20-Poly1305 authenticated encryption for envelope payloads
//!
//! Every payload gets its own one-time key, so a random 96-bit nonce is
//! never at risk of reuse under the same key.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroizing;

/// 256-bit key (32 bytes)
pub const KEY_SIZE: usize = 32;
/// 96-bit nonce (12 bytes)
pub const NONCE_SIZE: usize = 12;
/// Poly1305 tag (16 bytes)
pub const TAG_SIZE: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    #[error("Random generation failed")]
    Random,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Authentication tag verification failed")]
    TagMismatch,

    #[error("Ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("Invalid key size: expected {KEY_SIZE}, got {0}")]
    InvalidKeySize(usize),
}

/// Generate a one-time symmetric key from the OS CSPRNG
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_SIZE]>, CipherError> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    SystemRandom::new()
        .fill(key.as_mut())
        .map_err(|_| CipherError::Random)?;
    Ok(key)
}

fn generate_nonce() -> Result<[u8; NONCE_SIZE], CipherError> {
    let mut nonce = [0u8; NONCE_SIZE];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| CipherError::Random)?;
    Ok(nonce)
}

/// Encrypt plaintext with ChaCha20-Poly1305
///
/// Returns: nonce || ciphertext || tag
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if key.len() != KEY_SIZE {
        return Err(CipherError::InvalidKeySize(key.len()));
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| CipherError::InvalidKeySize(key.len()))?;

    let nonce_bytes = generate_nonce()?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| CipherError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt output of [`encrypt`]
///
/// Expects: nonce || ciphertext || tag
pub fn decrypt(key: &[u8], sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    if key.len() != KEY_SIZE {
        return Err(CipherError::InvalidKeySize(key.len()));
    }
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CipherError::Truncated(sealed.len()));
    }

    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|_| CipherError::InvalidKeySize(key.len()))?;

    let (nonce_bytes, encrypted) = sealed.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
        .map_err(|_| CipherError::TagMismatch)?;

    Ok(Zeroizing::new(plaintext))
}
