//! Error types for challenge fetching and handshakes

use std::fmt;

use thiserror::Error;
use ydentifi_crypto::CryptoError;

/// A failure in one step of talking to the service
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, timeout, or non-2xx response. `status` is `None`
    /// when no response arrived.
    #[error("transport failure{}: {body}", status_suffix(.status))]
    Transport { status: Option<u16>, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Which protocol was running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Envelope-encrypted credential (Protocol A)
    ServerAuthorization,
    /// Signed bearer token (Protocol B)
    ApiAuthToken,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::ServerAuthorization => write!(f, "server authorization"),
            Flow::ApiAuthToken => write!(f, "api auth token"),
        }
    }
}

/// Which step of the protocol failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FetchChallenge,
    Sign,
    EncodeResponse,
    EnvelopeEncrypt,
    EncodeCredential,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::FetchChallenge => "fetching the server challenge",
            Step::Sign => "signing the challenge",
            Step::EncodeResponse => "encoding the challenge response",
            Step::EnvelopeEncrypt => "envelope encryption",
            Step::EncodeCredential => "encoding the credential",
        };
        f.write_str(name)
    }
}

/// A handshake failure, tagged with where it happened
#[derive(Debug, Error)]
#[error("{flow}: {step} failed: {source}")]
pub struct HandshakeError {
    pub flow: Flow,
    pub step: Step,
    #[source]
    pub source: ClientError,
}

impl HandshakeError {
    pub fn new(flow: Flow, step: Step, source: impl Into<ClientError>) -> Self {
        Self {
            flow,
            step,
            source: source.into(),
        }
    }

    /// The underlying error, unmodified
    pub fn kind(&self) -> &ClientError {
        &self.source
    }
}

/// `map_err` adapter that tags an error with its flow and step
pub(crate) fn at<E>(flow: Flow, step: Step) -> impl FnOnce(E) -> HandshakeError
where
    E: Into<ClientError>,
{
    move |e| HandshakeError::new(flow, step, e)
}
