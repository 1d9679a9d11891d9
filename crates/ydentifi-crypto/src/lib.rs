//! Ydentifi Crypto - key material, signatures and envelope encryption
//!
//! This crate provides:
//! - Key pack generation (two RSA key pairs + a 256-bit API secret)
//! - RSA-PSS (SHA-256) detached signatures over raw bytes
//! - Hybrid envelope encryption: ChaCha20-Poly1305 payload, RSA-OAEP wrapped key
//! - A backend trait so protocol code never names a concrete algorithm

pub mod backend;
pub mod cipher;
pub mod encoding;
pub mod envelope;
pub mod keys;
pub mod signer;

pub use backend::{CryptoBackend, RsaBackend};
pub use envelope::EnvelopeCredential;
pub use keys::{ApiSecret, KeyPack, KeyPair};

/// Errors that can occur in cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Secret generation failed")]
    SecretGeneration,

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Signature verification failed: {0}")]
    Verification(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Deliberately opaque; the cause is only logged.
    #[error("Decryption failed")]
    Decryption,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
