//! Capability set consumed by the handshake code
//!
//! Protocol logic is written against [`CryptoBackend`] only. Swapping the
//! signature scheme, the key wrap, or the whole library means providing
//! another implementation, not touching the protocols.

use tracing::info;
use zeroize::Zeroizing;

use crate::envelope::{self, EnvelopeCredential};
use crate::keys::{self, ApiSecret, KeyPack, KeyPair, DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS};
use crate::{signer, CryptoError, Result};

pub trait CryptoBackend: Send + Sync {
    fn generate_key_pair(&self) -> Result<KeyPair>;

    fn random_secret(&self) -> Result<ApiSecret>;

    fn sign(&self, message: &[u8], private_key_pem: &str) -> Result<Vec<u8>>;

    fn verify(&self, message: &[u8], signature: &[u8], public_key_pem: &str) -> Result<bool>;

    fn envelope_encrypt(
        &self,
        plaintext: &[u8],
        recipient_public_key_pem: &str,
    ) -> Result<EnvelopeCredential>;

    fn envelope_decrypt(
        &self,
        credential: &EnvelopeCredential,
        recipient_private_key_pem: &str,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Two independent key pairs plus an API secret
    fn generate_key_pack(&self) -> Result<KeyPack> {
        let encryption = self.generate_key_pair()?;
        let signing = self.generate_key_pair()?;
        let api_secret = self.random_secret()?;
        let pack = KeyPack::assemble(encryption, signing, api_secret)?;
        info!("generated key pack");
        Ok(pack)
    }
}

/// RSA-PSS signatures and RSA-OAEP/ChaCha20-Poly1305 envelopes
#[derive(Debug, Clone, Copy)]
pub struct RsaBackend {
    modulus_bits: usize,
}

impl Default for RsaBackend {
    fn default() -> Self {
        Self {
            modulus_bits: DEFAULT_MODULUS_BITS,
        }
    }
}

impl RsaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a larger modulus for generated keys
    pub fn with_modulus_bits(modulus_bits: usize) -> Result<Self> {
        if modulus_bits < MIN_MODULUS_BITS {
            return Err(CryptoError::InvalidKey(format!(
                "modulus of {modulus_bits} bits is below the {MIN_MODULUS_BITS}-bit minimum"
            )));
        }
        Ok(Self { modulus_bits })
    }

    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }
}

impl CryptoBackend for RsaBackend {
    fn generate_key_pair(&self) -> Result<KeyPair> {
        keys::generate_key_pair(self.modulus_bits)
    }

    fn random_secret(&self) -> Result<ApiSecret> {
        keys::generate_api_secret()
    }

    fn sign(&self, message: &[u8], private_key_pem: &str) -> Result<Vec<u8>> {
        signer::sign(message, private_key_pem)
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key_pem: &str) -> Result<bool> {
        signer::verify(message, signature, public_key_pem)
    }

    fn envelope_encrypt(
        &self,
        plaintext: &[u8],
        recipient_public_key_pem: &str,
    ) -> Result<EnvelopeCredential> {
        envelope::envelope_encrypt(plaintext, recipient_public_key_pem)
    }

    fn envelope_decrypt(
        &self,
        credential: &EnvelopeCredential,
        recipient_private_key_pem: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        envelope::envelope_decrypt(credential, recipient_private_key_pem)
    }
}
