//! Service-side checks for issued credentials
//!
//! Everything that fails after the outer encoding has been parsed is
//! reported as the same [`VerifyError::Rejected`]. The reason goes to the
//! debug log only, so callers across a trust boundary learn nothing about
//! which check tripped.

use thiserror::Error;
use tracing::debug;
use ydentifi_crypto::{encoding, ApiSecret, CryptoBackend};

use crate::codec;
use crate::wire::{api_token_message, ApiAuthToken, ChallengeResponse};

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The credential text itself could not be parsed
    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential rejected")]
    Rejected,
}

fn reject(reason: &'static str) -> VerifyError {
    debug!(reason, "credential rejected");
    VerifyError::Rejected
}

/// Open a server-authorization credential and check its signature
///
/// `expected_challenge` is the challenge the service issued for this attempt.
pub fn open_server_authorization<C: CryptoBackend + ?Sized>(
    backend: &C,
    credential: &str,
    server_private_key_pem: &str,
    client_signing_public_key_pem: &str,
    expected_challenge: &str,
) -> Result<ChallengeResponse, VerifyError> {
    let envelope =
        codec::decode_credential(credential).map_err(|e| VerifyError::Malformed(e.to_string()))?;

    let plaintext = backend
        .envelope_decrypt(&envelope, server_private_key_pem)
        .map_err(|_| reject("envelope did not open"))?;
    let response: ChallengeResponse =
        codec::from_slice(&plaintext).map_err(|_| reject("challenge response unreadable"))?;

    if response.challenge != expected_challenge {
        return Err(reject("challenge mismatch"));
    }
    check_signature(
        backend,
        response.challenge.as_bytes(),
        &response.signature,
        client_signing_public_key_pem,
    )?;
    Ok(response)
}

/// Check an API token against the registered identity of its requestor
pub fn verify_api_auth_token<C: CryptoBackend + ?Sized>(
    backend: &C,
    token: &str,
    expected_requestor_id: &str,
    expected_secret: &ApiSecret,
    client_signing_public_key_pem: &str,
    expected_challenge: &str,
) -> Result<ApiAuthToken, VerifyError> {
    let token: ApiAuthToken =
        codec::from_slice(token.as_bytes()).map_err(|e| VerifyError::Malformed(e.to_string()))?;

    if token.requestor_id != expected_requestor_id {
        return Err(reject("requestor mismatch"));
    }
    if token.challenge != expected_challenge {
        return Err(reject("challenge mismatch"));
    }

    let password = zeroize::Zeroizing::new(
        encoding::from_base64(&token.requestor_password)
            .map_err(|_| reject("password unreadable"))?,
    );
    if !constant_time_eq(&password, expected_secret.expose_bytes()) {
        return Err(reject("password mismatch"));
    }

    check_signature(
        backend,
        &api_token_message(&token.requestor_id, &token.challenge),
        &token.signature,
        client_signing_public_key_pem,
    )?;
    Ok(token)
}

fn check_signature<C: CryptoBackend + ?Sized>(
    backend: &C,
    message: &[u8],
    signature: &[u8],
    public_key_pem: &str,
) -> Result<(), VerifyError> {
    match backend.verify(message, signature, public_key_pem) {
        Ok(true) => Ok(()),
        Ok(false) => Err(reject("signature mismatch")),
        Err(_) => Err(reject("signature unusable")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::{authorize_challenge, issue_api_auth_token};
    use crate::test_support::{client_signing_keys, server_encryption_keys};
    use ydentifi_crypto::keys::generate_api_secret;
    use ydentifi_crypto::RsaBackend;

    #[test]
    fn test_server_authorization_accepted() {
        let backend = RsaBackend::new();
        let server = server_encryption_keys();
        let client = client_signing_keys();
        let credential =
            authorize_challenge(&backend, "c2", server.public_key_pem(), client.private_key_pem())
                .unwrap();

        let response = open_server_authorization(
            &backend,
            &credential,
            server.private_key_pem(),
            client.public_key_pem(),
            "c2",
        )
        .unwrap();
        assert_eq!(response.challenge, "c2");
    }

    #[test]
    fn test_server_authorization_rejections_are_uniform() {
        let backend = RsaBackend::new();
        let server = server_encryption_keys();
        let client = client_signing_keys();
        let credential =
            authorize_challenge(&backend, "c2", server.public_key_pem(), client.private_key_pem())
                .unwrap();

        // replayed against another challenge
        let replay = open_server_authorization(
            &backend,
            &credential,
            server.private_key_pem(),
            client.public_key_pem(),
            "c3",
        );
        // wrong recipient key
        let wrong_recipient = open_server_authorization(
            &backend,
            &credential,
            client.private_key_pem(),
            client.public_key_pem(),
            "c2",
        );
        // signed by someone else
        let wrong_signer = open_server_authorization(
            &backend,
            &credential,
            server.private_key_pem(),
            server.public_key_pem(),
            "c2",
        );
        // tampered ciphertext
        let mut envelope = codec::decode_credential(&credential).unwrap();
        envelope.token[20] ^= 0x01;
        let tampered = open_server_authorization(
            &backend,
            &codec::encode_credential(&envelope).unwrap(),
            server.private_key_pem(),
            client.public_key_pem(),
            "c2",
        );

        for result in [replay, wrong_recipient, wrong_signer, tampered] {
            assert!(matches!(result, Err(VerifyError::Rejected)));
        }
    }

    #[test]
    fn test_garbage_credential_is_malformed() {
        let backend = RsaBackend::new();
        let result = open_server_authorization(
            &backend,
            "not-base64!",
            server_encryption_keys().private_key_pem(),
            client_signing_keys().public_key_pem(),
            "c2",
        );
        assert!(matches!(result, Err(VerifyError::Malformed(_))));
    }

    #[test]
    fn test_api_auth_token_checks() {
        let backend = RsaBackend::new();
        let client = client_signing_keys();
        let secret = generate_api_secret().unwrap();
        let other_secret = generate_api_secret().unwrap();
        let token =
            issue_api_auth_token(&backend, "app-1", &secret, "c1", client.private_key_pem())
                .unwrap();

        let client_pub = client.public_key_pem();
        let server_pub = server_encryption_keys().public_key_pem();

        let accepted =
            verify_api_auth_token(&backend, &token, "app-1", &secret, client_pub, "c1").unwrap();
        assert_eq!(accepted.challenge, "c1");

        let rejections = [
            verify_api_auth_token(&backend, &token, "app-2", &secret, client_pub, "c1"),
            verify_api_auth_token(&backend, &token, "app-1", &other_secret, client_pub, "c1"),
            verify_api_auth_token(&backend, &token, "app-1", &secret, client_pub, "c9"),
            verify_api_auth_token(&backend, &token, "app-1", &secret, server_pub, "c1"),
        ];
        for result in rejections {
            assert!(matches!(result, Err(VerifyError::Rejected)));
        }
    }

    #[test]
    fn test_api_auth_token_signature_mutation() {
        let backend = RsaBackend::new();
        let client = client_signing_keys();
        let secret = generate_api_secret().unwrap();
        let text =
            issue_api_auth_token(&backend, "app-1", &secret, "c1", client.private_key_pem())
                .unwrap();

        let mut token: ApiAuthToken = codec::from_slice(text.as_bytes()).unwrap();
        token.signature[5] ^= 0x01;
        let mutated = codec::to_text(&token).unwrap();

        assert!(matches!(
            verify_api_auth_token(
                &backend,
                &mutated,
                "app-1",
                &secret,
                client.public_key_pem(),
                "c1",
            ),
            Err(VerifyError::Rejected)
        ));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
    }
}
