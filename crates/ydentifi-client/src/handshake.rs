//! The two credential protocols
//!
//! Server authorization (envelope-encrypted):
//!   challenge -> sign -> ChallengeResponse -> envelope under server key -> base64
//!
//! API auth token (signature only):
//!   challenge -> sign(requestor_id || challenge) -> ApiAuthToken JSON
//!
//! Nothing is kept between calls. A failed attempt is retried by starting
//! over with a fresh challenge.

use tracing::{debug, info, warn};
use ydentifi_crypto::{ApiSecret, CryptoBackend, CryptoError, KeyPack, RsaBackend};

use crate::codec;
use crate::config::ClientConfig;
use crate::error::{at, ClientError, Flow, HandshakeError, Step};
use crate::transport::{ChallengeTransport, HttpTransport};
use crate::wire::{api_token_message, ApiAuthToken, ChallengeResponse, ServerChallenge};

/// Sign a server challenge and seal the response for the server
///
/// Returns the base64 text of the JSON envelope.
pub fn authorize_challenge<C: CryptoBackend + ?Sized>(
    backend: &C,
    challenge: &str,
    server_public_encryption_key_pem: &str,
    client_signing_key_pem: &str,
) -> Result<String, HandshakeError> {
    let flow = Flow::ServerAuthorization;

    let signature = backend
        .sign(challenge.as_bytes(), client_signing_key_pem)
        .map_err(at(flow, Step::Sign))?;

    let response = ChallengeResponse {
        challenge: challenge.to_string(),
        signature,
    };
    let plaintext = zeroize::Zeroizing::new(
        codec::to_bytes(&response).map_err(at(flow, Step::EncodeResponse))?,
    );

    let credential = backend
        .envelope_encrypt(&plaintext, server_public_encryption_key_pem)
        .map_err(at(flow, Step::EnvelopeEncrypt))?;

    let encoded = codec::encode_credential(&credential).map_err(at(flow, Step::EncodeCredential))?;
    debug!(credential_len = encoded.len(), "server authorization issued");
    Ok(encoded)
}

/// Sign `requestor_id || challenge` and wrap it in an API token
///
/// Returns the token's JSON text.
pub fn issue_api_auth_token<C: CryptoBackend + ?Sized>(
    backend: &C,
    requestor_id: &str,
    api_secret: &ApiSecret,
    challenge: &str,
    client_signing_key_pem: &str,
) -> Result<String, HandshakeError> {
    let flow = Flow::ApiAuthToken;

    let signature = backend
        .sign(&api_token_message(requestor_id, challenge), client_signing_key_pem)
        .map_err(at(flow, Step::Sign))?;

    let token = ApiAuthToken {
        requestor_id: requestor_id.to_string(),
        requestor_password: api_secret.to_text(),
        challenge: challenge.to_string(),
        signature,
    };
    let encoded = codec::to_text(&token).map_err(at(flow, Step::EncodeCredential))?;
    debug!(requestor_id, "api auth token issued");
    Ok(encoded)
}

/// Intermediary between a consumer application and the API
pub struct YdentifiClient<T, C = RsaBackend> {
    config: ClientConfig,
    transport: T,
    backend: C,
}

impl YdentifiClient<HttpTransport, RsaBackend> {
    /// HTTP transport and the default RSA backend
    pub fn http(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport, RsaBackend::new()))
    }
}

impl<T: ChallengeTransport, C: CryptoBackend> YdentifiClient<T, C> {
    pub fn new(config: ClientConfig, transport: T, backend: C) -> Self {
        Self {
            config,
            transport,
            backend,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Generate all secrets needed to communicate with the API
    pub fn key_pack(&self) -> Result<KeyPack, CryptoError> {
        self.backend.generate_key_pack()
    }

    /// Fetch one challenge, bounded by the configured timeout
    pub async fn fetch_server_challenge(&self) -> Result<ServerChallenge, ClientError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.transport.fetch_challenge()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Transport {
                status: None,
                body: format!("no challenge within {} ms", timeout.as_millis()),
            }),
        }
    }

    /// Run the server-authorization flow end to end
    pub async fn server_authorization(
        &self,
        client_signing_key_pem: &str,
    ) -> Result<String, HandshakeError> {
        let flow = Flow::ServerAuthorization;
        let result = async {
            let challenge = self
                .fetch_server_challenge()
                .await
                .map_err(at(flow, Step::FetchChallenge))?;
            let server_key = challenge
                .server_public_encryption_key
                .as_deref()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    HandshakeError::new(
                        flow,
                        Step::FetchChallenge,
                        ClientError::Decode(
                            "challenge carries no ServerPublicEncryptionKey".to_string(),
                        ),
                    )
                })?;
            authorize_challenge(
                &self.backend,
                &challenge.authorization_challenge,
                server_key,
                client_signing_key_pem,
            )
        }
        .await;
        self.report(flow, result)
    }

    /// Run the API-token flow end to end, using `client_app_id` as requestor
    pub async fn api_auth_token(
        &self,
        client_signing_key_pem: &str,
        api_secret: &ApiSecret,
    ) -> Result<String, HandshakeError> {
        let flow = Flow::ApiAuthToken;
        let result = async {
            let challenge = self
                .fetch_server_challenge()
                .await
                .map_err(at(flow, Step::FetchChallenge))?;
            issue_api_auth_token(
                &self.backend,
                &self.config.client_app_id,
                api_secret,
                &challenge.authorization_challenge,
                client_signing_key_pem,
            )
        }
        .await;
        self.report(flow, result)
    }

    fn report(
        &self,
        flow: Flow,
        result: Result<String, HandshakeError>,
    ) -> Result<String, HandshakeError> {
        match &result {
            Ok(_) => info!(%flow, client_app_id = %self.config.client_app_id, "credential issued"),
            Err(e) => warn!(%flow, step = %e.step, error = %e.source, "handshake failed"),
        }
        result
    }
}
