//! Ydentifi Client - talk to the Ydentifi MFA API
//!
//! Two ways to obtain credentials from a server challenge:
//! - [`YdentifiClient::server_authorization`]: signed challenge response,
//!   envelope-encrypted for the server, base64 text
//! - [`YdentifiClient::api_auth_token`]: `RequestorId || Challenge` signed,
//!   sent with the API secret as a JSON bearer token
//!
//! [`verify`] holds the matching checks a service performs.

pub mod codec;
pub mod config;
pub mod error;
pub mod handshake;
pub mod payloads;
pub mod transport;
pub mod verify;
pub mod wire;

pub use config::ClientConfig;
pub use error::{ClientError, Flow, HandshakeError, Step};
pub use handshake::{authorize_challenge, issue_api_auth_token, YdentifiClient};
pub use transport::{ChallengeTransport, HttpTransport};
pub use verify::{open_server_authorization, verify_api_auth_token, VerifyError};
pub use wire::{ApiAuthToken, ChallengeResponse, ServerChallenge};
