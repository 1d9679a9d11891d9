//! RSASSA-PSS (SHA-256) detached signatures
//!
//! Signing uses a random salt and blinding, so two signatures over the same
//! message differ but both verify.

use rand::rngs::OsRng;
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::traits::PublicKeyParts;
use sha2::Sha256;
use tracing::debug;

use crate::keys::{parse_private_key, parse_public_key};
use crate::{CryptoError, Result};

/// Sign raw message bytes with a PEM private key
pub fn sign(message: &[u8], private_key_pem: &str) -> Result<Vec<u8>> {
    let private_key =
        parse_private_key(private_key_pem).map_err(|e| CryptoError::Signing(e.to_string()))?;
    let signing_key = BlindedSigningKey::<Sha256>::new(private_key);

    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, message)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    Ok(signature.to_vec())
}

/// Verify a detached signature
///
/// `Ok(false)` means the signature is well-formed but wrong for this
/// message and key. `Err` is reserved for unusable inputs.
pub fn verify(message: &[u8], signature: &[u8], public_key_pem: &str) -> Result<bool> {
    let public_key =
        parse_public_key(public_key_pem).map_err(|e| CryptoError::Verification(e.to_string()))?;

    if signature.len() != public_key.size() {
        return Err(CryptoError::Verification(format!(
            "signature is {} bytes, key expects {}",
            signature.len(),
            public_key.size()
        )));
    }

    let signature = Signature::try_from(signature)
        .map_err(|e| CryptoError::Verification(e.to_string()))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);

    match verifying_key.verify(message, &signature) {
        Ok(()) => Ok(true),
        Err(_) => {
            debug!(message_len = message.len(), "signature did not verify");
            Ok(false)
        }
    }
}
