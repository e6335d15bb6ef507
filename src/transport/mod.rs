//! Transport layer: endpoint paths and JSON wire-format details.

mod auth;
mod contacts;
mod notifications;
mod profile;
mod settings;
mod social;

pub use auth::{
    ACTIVATE_PATH, INCORRECT_ACTIVATION_CODE, INCORRECT_PWD_TOKEN, LOGIN_PATH, PROFILE_ME_PATH,
    USER_NOT_FOUND, decode_account_id, decode_token_grant, encode_activation, encode_login,
};
pub use contacts::{
    encode_block_numbers, encode_block_profile, encode_call_log_sync, encode_contact_ids,
    encode_contacts_sync, encode_location,
};
pub use notifications::{encode_notifications_path, encode_read_notification};
pub use profile::{PROFILE_PATH, decode_age, encode_profile_update};
pub use settings::{SETTINGS_PATH, encode_notification_settings, encode_social_settings};
pub use social::{encode_report_spam, encode_social_link, encode_social_name};

use serde_json::{Map, Value};

/// Keys whose echoed value differs from what was sent, skipping `ignored` keys.
pub fn diff_echoed(sent: &Map<String, Value>, echoed: &Value, ignored: &[&str]) -> Vec<String> {
    sent.iter()
        .filter(|(key, _)| !ignored.contains(&key.as_str()))
        .filter(|(key, value)| echoed.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect()
}

pub fn bool_field(body: &Value, field: &str) -> Option<bool> {
    body.get(field).and_then(Value::as_bool)
}

pub fn u64_field(body: &Value, field: &str) -> Option<u64> {
    body.get(field).and_then(Value::as_u64)
}
