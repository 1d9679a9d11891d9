//! Key material for a consumer application identity
//!
//! A [`KeyPack`] holds everything an app needs to talk to the API:
//! an RSA pair for receiving encrypted data, an RSA pair for signing
//! challenges, and a 256-bit API secret. Private halves are kept in
//! zeroizing containers and never printed by `Debug`.

use rand::rngs::OsRng;
use ring::rand::{SecureRandom, SystemRandom};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, Secret, SecretString};
use tracing::debug;

use crate::{encoding, CryptoError, Result};

/// Smallest modulus accepted for generated keys
pub const MIN_MODULUS_BITS: usize = 2048;
/// Modulus used unless configured otherwise
pub const DEFAULT_MODULUS_BITS: usize = 2048;
/// API secret length (256 bits)
pub const API_SECRET_LEN: usize = 32;

/// A PEM-encoded RSA key pair
#[derive(Debug)]
pub struct KeyPair {
    private_key_pem: SecretString,
    public_key_pem: String,
}

impl KeyPair {
    pub fn from_pem(private_key_pem: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            private_key_pem: SecretString::new(private_key_pem.into()),
            public_key_pem: public_key_pem.into(),
        }
    }

    /// PKCS#8 PEM of the private key
    pub fn private_key_pem(&self) -> &str {
        self.private_key_pem.expose_secret()
    }

    /// SubjectPublicKeyInfo PEM of the public key
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Check that both halves decode and belong together.
    pub fn validate(&self) -> Result<()> {
        let private_key = parse_private_key(self.private_key_pem())?;
        private_key
            .validate()
            .map_err(|e| CryptoError::InvalidKey(format!("inconsistent private key: {e}")))?;
        let public_key = parse_public_key(&self.public_key_pem)?;
        if RsaPublicKey::from(&private_key) != public_key {
            return Err(CryptoError::InvalidKey(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(())
    }
}

/// The 256-bit API password shared with the service
#[derive(Debug)]
pub struct ApiSecret(Secret<[u8; API_SECRET_LEN]>);

impl ApiSecret {
    pub fn from_bytes(bytes: [u8; API_SECRET_LEN]) -> Self {
        Self(Secret::new(bytes))
    }

    /// Parse the text form produced by [`ApiSecret::to_text`].
    pub fn from_text(text: &str) -> Result<Self> {
        let decoded = zeroize::Zeroizing::new(
            encoding::from_base64(text)
                .map_err(|e| CryptoError::InvalidKey(format!("api secret is not base64: {e}")))?,
        );
        let bytes: [u8; API_SECRET_LEN] = decoded.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "api secret must be {API_SECRET_LEN} bytes, got {}",
                decoded.len()
            ))
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn expose_bytes(&self) -> &[u8; API_SECRET_LEN] {
        self.0.expose_secret()
    }

    /// Base64 text form, as sent in `RequestorPassword`
    pub fn to_text(&self) -> String {
        encoding::to_base64(self.expose_bytes())
    }
}

/// Full cryptographic identity of one consumer application
#[derive(Debug)]
pub struct KeyPack {
    pub encryption: KeyPair,
    pub signing: KeyPair,
    pub api_secret: ApiSecret,
}

impl KeyPack {
    /// Combine independently generated parts, refusing identical key pairs.
    pub fn assemble(encryption: KeyPair, signing: KeyPair, api_secret: ApiSecret) -> Result<Self> {
        if encryption.public_key_pem == signing.public_key_pem
            || encryption.private_key_pem() == signing.private_key_pem()
        {
            return Err(CryptoError::KeyGeneration(
                "encryption and signing key pairs are identical".to_string(),
            ));
        }
        Ok(Self {
            encryption,
            signing,
            api_secret,
        })
    }

    pub fn encryption_private_key(&self) -> &str {
        self.encryption.private_key_pem()
    }

    pub fn encryption_public_key(&self) -> &str {
        self.encryption.public_key_pem()
    }

    pub fn signing_private_key(&self) -> &str {
        self.signing.private_key_pem()
    }

    pub fn signing_public_key(&self) -> &str {
        self.signing.public_key_pem()
    }
}

/// Generate a fresh RSA key pair and PEM-encode both halves
pub fn generate_key_pair(modulus_bits: usize) -> Result<KeyPair> {
    if modulus_bits < MIN_MODULUS_BITS {
        return Err(CryptoError::InvalidKey(format!(
            "modulus of {modulus_bits} bits is below the {MIN_MODULUS_BITS}-bit minimum"
        )));
    }

    let private_key = RsaPrivateKey::new(&mut OsRng, modulus_bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyGeneration(format!("private key encoding: {e}")))?;
    let public_pem = public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyGeneration(format!("public key encoding: {e}")))?;

    debug!(modulus_bits, "generated RSA key pair");
    Ok(KeyPair::from_pem(private_pem.as_str(), public_pem))
}

/// Generate the 256-bit API secret
pub fn generate_api_secret() -> Result<ApiSecret> {
    let mut bytes = zeroize::Zeroizing::new([0u8; API_SECRET_LEN]);
    SystemRandom::new()
        .fill(bytes.as_mut())
        .map_err(|_| CryptoError::SecretGeneration)?;
    Ok(ApiSecret::from_bytes(*bytes))
}

/// Decode an RSA private key from PKCS#8 or PKCS#1 PEM
pub fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::InvalidKey(format!("unreadable RSA private key PEM: {e}")))
}

/// Decode an RSA public key from SubjectPublicKeyInfo or PKCS#1 PEM
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| CryptoError::InvalidKey(format!("unreadable RSA public key PEM: {e}")))
}

/// Key pairs shared by the tests of this crate; RSA generation is slow.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::sync::OnceLock;

    pub fn alice() -> &'static KeyPair {
        static KEYS: OnceLock<KeyPair> = OnceLock::new();
        KEYS.get_or_init(|| generate_key_pair(DEFAULT_MODULUS_BITS).unwrap())
    }

    pub fn bob() -> &'static KeyPair {
        static KEYS: OnceLock<KeyPair> = OnceLock::new();
        KEYS.get_or_init(|| generate_key_pair(DEFAULT_MODULUS_BITS).unwrap())
    }
}
