use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::domain::{AccessToken, AccountId, ActivationCode, PhoneNumber, RefreshToken};

pub const ACTIVATE_PATH: &str = "/auth/authorization/activate/";
pub const LOGIN_PATH: &str = "/auth/authorization/login/";
pub const PROFILE_ME_PATH: &str = "/main/users/profile/me/";

/// Error message for a wrong activation code (HTTP 400).
pub const INCORRECT_ACTIVATION_CODE: &str = "api_incorrect_activation_code";
/// Error message for a rejected password token (HTTP 400).
pub const INCORRECT_PWD_TOKEN: &str = "api_incorrect_pwd_token";
/// Error detail when the activated number has no profile yet (HTTP 401).
pub const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Tokens returned by the activation and login endpoints.
pub struct TokenGrant {
    pub access: Option<AccessToken>,
    pub refresh: Option<RefreshToken>,
    pub pwd_token: Option<RefreshToken>,
    /// Fields other than the tokens, as returned.
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TokenGrantJson {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(default)]
    pwd_token: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileIdJson {
    #[serde(default)]
    uuid: Option<String>,
}

pub fn encode_activation(phone_number: PhoneNumber, code: &ActivationCode) -> Value {
    json!({
        (ActivationCode::FIELD): code.as_str(),
        "activation_type": "sms",
        (PhoneNumber::FIELD): phone_number.as_u64(),
    })
}

/// The login endpoint expects the phone number as a string, unlike activation.
pub fn encode_login(phone_number: PhoneNumber, pwd_token: &RefreshToken) -> Value {
    json!({
        (PhoneNumber::FIELD): phone_number.to_string(),
        "pwd_token": pwd_token.as_str(),
    })
}

/// Decode a token grant. Bodies that are not objects yield an empty grant.
pub fn decode_token_grant(body: &Value) -> TokenGrant {
    let parsed = TokenGrantJson::deserialize(body).unwrap_or_default();
    TokenGrant {
        access: parsed.access.and_then(|v| AccessToken::new(v).ok()),
        refresh: parsed.refresh.and_then(|v| RefreshToken::new(v).ok()),
        pwd_token: parsed.pwd_token.and_then(|v| RefreshToken::new(v).ok()),
        extra: parsed.extra,
    }
}

pub fn decode_account_id(body: &Value) -> Option<AccountId> {
    ProfileIdJson::deserialize(body)
        .ok()
        .and_then(|parsed| parsed.uuid)
        .and_then(|uuid| AccountId::new(uuid).ok())
}
