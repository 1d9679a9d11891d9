//! Text encodings for binary values on the wire

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Standard (padded) base64
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}

/// Serde adapter: `Vec<u8>` fields travel as base64 strings.
///
/// Use with `#[serde(with = "ydentifi_crypto::encoding::b64")]`.
pub mod b64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::from_base64(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Blob {
        #[serde(with = "b64")]
        data: Vec<u8>,
    }

    #[test]
    fn test_bytes_serialize_as_base64() {
        let blob = Blob { data: vec![0xde, 0xad, 0xbe, 0xef] };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"data":"3q2+7w=="}"#);
        assert_eq!(serde_json::from_str::<Blob>(&json).unwrap(), blob);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(serde_json::from_str::<Blob>(r#"{"data":"not base64!"}"#).is_err());
        assert!(from_base64("@@@").is_err());
    }
}
