//! Hybrid envelope encryption for a recipient known only by an RSA public key
//!
//! {Enc(RSA-OAEP, DEK), Enc(DEK, plaintext)}
//!
//! A fresh ChaCha20-Poly1305 key (DEK) seals the payload, and only the DEK
//! goes through RSA. Payload size is therefore unbounded.

use std::fmt;

use rand::rngs::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use crate::cipher::{self, CipherError};
use crate::keys::{parse_private_key, parse_public_key};
use crate::{encoding, CryptoError, Result};

/// Ciphertext plus the wrapped one-time key needed to open it
///
/// Wire form: `{"Token": base64, "EncryptedKey": base64}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvelopeCredential {
    /// nonce || ciphertext || tag under the one-time key
    #[serde(with = "encoding::b64")]
    pub token: Vec<u8>,
    /// One-time key, RSA-OAEP(SHA-256) encrypted for the recipient
    #[serde(with = "encoding::b64")]
    pub encrypted_key: Vec<u8>,
}

/// Why an envelope could not be opened. Logged, never returned.
#[derive(Debug)]
enum OpenFailure {
    UnreadableKey,
    KeyRecovery,
    KeyLength(usize),
    Payload(CipherError),
}

impl fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenFailure::UnreadableKey => write!(f, "recipient private key unreadable"),
            OpenFailure::KeyRecovery => write!(f, "key recovery failed"),
            OpenFailure::KeyLength(len) => write!(f, "recovered key has {len} bytes"),
            OpenFailure::Payload(e) => write!(f, "payload: {e}"),
        }
    }
}

/// Seal `plaintext` for the holder of `recipient_public_key_pem`
pub fn envelope_encrypt(
    plaintext: &[u8],
    recipient_public_key_pem: &str,
) -> Result<EnvelopeCredential> {
    let public_key = parse_public_key(recipient_public_key_pem)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let key = cipher::generate_key().map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let token =
        cipher::encrypt(&key[..], plaintext).map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let encrypted_key = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &key[..])
        .map_err(|e| CryptoError::Encryption(format!("key wrap: {e}")))?;

    debug!(
        plaintext_len = plaintext.len(),
        token_len = token.len(),
        "sealed envelope"
    );
    Ok(EnvelopeCredential {
        token,
        encrypted_key,
    })
}

/// Open an envelope with the recipient's private key
///
/// Every failure surfaces as the same [`CryptoError::Decryption`]; the
/// specific cause only goes to the debug log.
pub fn envelope_decrypt(
    credential: &EnvelopeCredential,
    recipient_private_key_pem: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    open(credential, recipient_private_key_pem).map_err(|failure| {
        debug!(reason = %failure, "envelope rejected");
        CryptoError::Decryption
    })
}

fn open(
    credential: &EnvelopeCredential,
    recipient_private_key_pem: &str,
) -> std::result::Result<Zeroizing<Vec<u8>>, OpenFailure> {
    let private_key =
        parse_private_key(recipient_private_key_pem).map_err(|_| OpenFailure::UnreadableKey)?;

    let key = Zeroizing::new(
        private_key
            .decrypt(Oaep::new::<Sha256>(), &credential.encrypted_key)
            .map_err(|_| OpenFailure::KeyRecovery)?,
    );
    if key.len() != cipher::KEY_SIZE {
        return Err(OpenFailure::KeyLength(key.len()));
    }

    cipher::decrypt(&key[..], &credential.token).map_err(OpenFailure::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::fixtures::{alice, bob};

    #[test]
    fn test_roundtrip_small_and_empty() {
        let keys = alice();
        let plaintexts: [&[u8]; 3] = [b"", b"c2", br#"{"Challenge":"c2","Signature":"AAAA"}"#];
        for plaintext in plaintexts {
            let sealed = envelope_encrypt(plaintext, keys.public_key_pem()).unwrap();
            let opened = envelope_decrypt(&sealed, keys.private_key_pem()).unwrap();
            assert_eq!(opened.as_slice(), plaintext);
        }
    }

    #[test]
    fn test_roundtrip_larger_than_modulus() {
        let keys = alice();
        // 2048-bit OAEP(SHA-256) tops out at 190 bytes of direct payload
        let plaintext: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let sealed = envelope_encrypt(&plaintext, keys.public_key_pem()).unwrap();
        assert_eq!(sealed.encrypted_key.len(), 256);
        assert_eq!(
            sealed.token.len(),
            cipher::NONCE_SIZE + plaintext.len() + cipher::TAG_SIZE
        );

        let opened = envelope_decrypt(&sealed, keys.private_key_pem()).unwrap();
        assert_eq!(opened.as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_fresh_key_per_envelope() {
        let keys = alice();
        let a = envelope_encrypt(b"same", keys.public_key_pem()).unwrap();
        let b = envelope_encrypt(b"same", keys.public_key_pem()).unwrap();
        assert_ne!(a.encrypted_key, b.encrypted_key);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_tampered_token_fails() {
        let keys = alice();
        let sealed = envelope_encrypt(b"challenge response", keys.public_key_pem()).unwrap();

        for i in [0, cipher::NONCE_SIZE, sealed.token.len() - 1] {
            let mut tampered = sealed.clone();
            tampered.token[i] ^= 0x01;
            assert!(matches!(
                envelope_decrypt(&tampered, keys.private_key_pem()),
                Err(CryptoError::Decryption)
            ));
        }
    }

    #[test]
    fn test_tampered_encrypted_key_fails() {
        let keys = alice();
        let sealed = envelope_encrypt(b"challenge response", keys.public_key_pem()).unwrap();

        for i in [0, 128, sealed.encrypted_key.len() - 1] {
            let mut tampered = sealed.clone();
            tampered.encrypted_key[i] ^= 0x01;
            assert!(matches!(
                envelope_decrypt(&tampered, keys.private_key_pem()),
                Err(CryptoError::Decryption)
            ));
        }
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let sealed = envelope_encrypt(b"for alice", alice().public_key_pem()).unwrap();
        assert!(matches!(
            envelope_decrypt(&sealed, bob().private_key_pem()),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_short_wrapped_key_is_hard_failure() {
        let keys = alice();
        let public_key = parse_public_key(keys.public_key_pem()).unwrap();
        let mut sealed = envelope_encrypt(b"payload", keys.public_key_pem()).unwrap();
        sealed.encrypted_key = public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &[0u8; 16])
            .unwrap();

        assert!(matches!(
            envelope_decrypt(&sealed, keys.private_key_pem()),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_unusable_recipient_key() {
        assert!(matches!(
            envelope_encrypt(b"data", "garbage"),
            Err(CryptoError::Encryption(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let credential = EnvelopeCredential {
            token: vec![1, 2, 3],
            encrypted_key: vec![4, 5, 6],
        };
        let json = serde_json::to_string(&credential).unwrap();
        assert_eq!(json, r#"{"Token":"AQID","EncryptedKey":"BAUG"}"#);
    }
}
