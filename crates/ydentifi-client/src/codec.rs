//! Deterministic conversion between wire records and bytes

use serde::de::DeserializeOwned;
use serde::Serialize;
use ydentifi_crypto::{encoding, EnvelopeCredential};

use crate::ClientError;

/// Serialize a record to compact JSON bytes
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ClientError> {
    Ok(serde_json::to_vec(value)?)
}

/// Serialize a record to compact JSON text
pub fn to_text<T: Serialize>(value: &T) -> Result<String, ClientError> {
    Ok(serde_json::to_string(value)?)
}

pub fn from_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Final server-authorization form: base64 of the JSON envelope
pub fn encode_credential(credential: &EnvelopeCredential) -> Result<String, ClientError> {
    Ok(encoding::to_base64(&to_bytes(credential)?))
}

pub fn decode_credential(text: &str) -> Result<EnvelopeCredential, ClientError> {
    let json = encoding::from_base64(text)
        .map_err(|e| ClientError::Decode(format!("credential is not base64: {e}")))?;
    from_slice(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ChallengeResponse;

    #[test]
    fn test_credential_text_form() {
        let credential = EnvelopeCredential {
            token: vec![1, 2, 3],
            encrypted_key: vec![4, 5, 6],
        };
        let text = encode_credential(&credential).unwrap();
        assert_eq!(
            encoding::from_base64(&text).unwrap(),
            br#"{"Token":"AQID","EncryptedKey":"BAUG"}"#.to_vec()
        );
        assert_eq!(decode_credential(&text).unwrap(), credential);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let response = ChallengeResponse {
            challenge: "c2".to_string(),
            signature: vec![9; 4],
        };
        assert_eq!(to_bytes(&response).unwrap(), to_bytes(&response.clone()).unwrap());
        assert_eq!(
            to_text(&response).unwrap(),
            r#"{"Challenge":"c2","Signature":"CQkJCQ=="}"#
        );
    }

    #[test]
    fn test_malformed_inputs_are_decode_errors() {
        assert!(matches!(
            decode_credential("%%%"),
            Err(ClientError::Decode(_))
        ));
        let not_json = encoding::to_base64(b"hello");
        assert!(matches!(
            decode_credential(&not_json),
            Err(ClientError::Decode(_))
        ));
        assert!(matches!(
            from_slice::<ChallengeResponse>(br#"{"Challenge":"c2"}"#),
            Err(ClientError::Decode(_))
        ));
    }
}
