use serde_json::{Map, Value};

use crate::domain::{NotificationSettingsUpdate, SocialSettingsUpdate, ValidationError};

pub const SETTINGS_PATH: &str = "/main/settings/";

const SOCIAL_FIELDS: &[(&str, fn(&SocialSettingsUpdate) -> Option<Value>)] = &[
    ("mutual_contacts_available", |u| u.mutual_contacts_available.map(Value::from)),
    ("who_watched_enabled", |u| u.who_watched_enabled.map(Value::from)),
    ("who_deleted_enabled", |u| u.who_deleted_enabled.map(Value::from)),
    ("comments_enabled", |u| u.comments_enabled.map(Value::from)),
    ("location_enabled", |u| u.location_enabled.map(Value::from)),
    ("language", |u| u.language.as_ref().map(|v| Value::from(v.as_str()))),
];

const NOTIFICATION_FIELDS: &[(&str, fn(&NotificationSettingsUpdate) -> Option<bool>)] = &[
    ("who_deleted_notification_enabled", |u| u.who_deleted_notification_enabled),
    ("who_watched_notification_enabled", |u| u.who_watched_notification_enabled),
    ("distance_notification_enabled", |u| u.distance_notification_enabled),
    ("system_notification_enabled", |u| u.system_notification_enabled),
    ("birthday_notification_enabled", |u| u.birthday_notification_enabled),
    ("comments_notification_enabled", |u| u.comments_notification_enabled),
    ("names_notification_enabled", |u| u.names_notification_enabled),
    ("notifications_enabled", |u| u.notifications_enabled),
];

pub fn encode_social_settings(
    update: &SocialSettingsUpdate,
) -> Result<Map<String, Value>, ValidationError> {
    let body = SOCIAL_FIELDS
        .iter()
        .filter_map(|(key, get)| get(update).map(|value| ((*key).to_owned(), value)))
        .collect::<Map<_, _>>();
    non_empty(body, "social settings")
}

pub fn encode_notification_settings(
    update: &NotificationSettingsUpdate,
) -> Result<Map<String, Value>, ValidationError> {
    let body = NOTIFICATION_FIELDS
        .iter()
        .filter_map(|(key, get)| get(update).map(|value| ((*key).to_owned(), Value::from(value))))
        .collect::<Map<_, _>>();
    non_empty(body, "notification settings")
}

fn non_empty(
    body: Map<String, Value>,
    what: &'static str,
) -> Result<Map<String, Value>, ValidationError> {
    if body.is_empty() {
        return Err(ValidationError::NothingToUpdate { what });
    }
    Ok(body)
}
