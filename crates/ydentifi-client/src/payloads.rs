//! Request and response bodies for the user lifecycle endpoints
//!
//! One record per shape. Endpoints that need an identity proof or extra
//! profile fields set the corresponding `Option`; absent fields are left
//! out of the JSON entirely.

use serde::{Deserialize, Serialize};

/// Body for create/unlock/delete user, mobile 2FA enrollment and
/// email+password authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPayload {
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_plaintext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_proof_token: Option<String>,
}

impl UserPayload {
    pub fn new(user_email: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            ..Self::default()
        }
    }

    pub fn with_phone(
        mut self,
        phone_number: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.user_phone_number = Some(phone_number.into());
        self.user_display_name = Some(display_name.into());
        self
    }

    pub fn with_password(
        mut self,
        password: impl Into<String>,
        identity_proof_token: impl Into<String>,
    ) -> Self {
        self.password_plaintext = Some(password.into());
        self.identity_proof_token = Some(identity_proof_token.into());
        self
    }
}

/// Body for soft-token enrollment (no TOTP) and second-factor authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecondFactorPayload {
    pub identity_proof_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp: Option<String>,
}

/// Rotate the app's registered public keys (PEM)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePublicKeysPayload {
    pub new_encryption_public_key: String,
    pub new_signing_public_key: String,
}

/// User record as shared with a frontend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecordData {
    pub user_email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub user_display_name: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
}
