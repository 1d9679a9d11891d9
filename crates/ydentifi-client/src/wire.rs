//! Records exchanged with the service
//!
//! Field names follow the API's PascalCase JSON. Binary values travel as
//! standard base64.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use ydentifi_crypto::encoding;
use zeroize::Zeroize;

/// Nonce issued by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerChallenge {
    pub authorization_challenge: String,
    /// Only sent on the server-authorization flow. A blank value means absent.
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_public_encryption_key: Option<String>,
}

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// Proof of possession of the signing key over one challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChallengeResponse {
    pub challenge: String,
    #[serde(with = "encoding::b64")]
    pub signature: Vec<u8>,
}

/// Self-contained bearer credential for direct API calls
///
/// `signature` covers `requestor_id || challenge`, see [`api_token_message`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiAuthToken {
    pub requestor_id: String,
    pub requestor_password: String,
    pub challenge: String,
    #[serde(with = "encoding::b64")]
    pub signature: Vec<u8>,
}

impl fmt::Debug for ApiAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiAuthToken")
            .field("requestor_id", &self.requestor_id)
            .field("requestor_password", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

impl Drop for ApiAuthToken {
    fn drop(&mut self) {
        self.requestor_password.zeroize();
    }
}

/// Exact bytes signed for an [`ApiAuthToken`]: plain concatenation, no separator.
pub fn api_token_message(requestor_id: &str, challenge: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(requestor_id.len() + challenge.len());
    message.extend_from_slice(requestor_id.as_bytes());
    message.extend_from_slice(challenge.as_bytes());
    message
}
