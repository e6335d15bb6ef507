use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::domain::{
    BirthDate, CountryCode, Email, FacebookId, ProfilePictureUrl, ProfileUpdate,
    ValidationError,
};

pub const PROFILE_PATH: &str = "/main/users/profile/";

type Getter = fn(&ProfileUpdate) -> Option<Value>;

const PROFILE_FIELDS: &[(&str, Getter)] = &[
    (CountryCode::FIELD, |u| u.country_code.as_ref().map(|v| v.as_str().into())),
    (BirthDate::FIELD, |u| u.date_of_birth.as_ref().map(|v| v.as_str().into())),
    ("device_type", |u| u.device_type.map(|v| v.as_str().into())),
    ("login_type", |u| u.login_type.map(|v| v.as_str().into())),
    (Email::FIELD, |u| u.email.as_ref().map(|v| v.as_str().into())),
    (FacebookId::FIELD, |u| u.facebook_id.as_ref().map(|v| v.as_str().into())),
    ("first_name", |u| u.first_name.as_deref().map(Value::from)),
    ("last_name", |u| u.last_name.as_deref().map(Value::from)),
    ("gender", |u| u.gender.map(|v| v.as_wire().map_or(Value::Null, Value::from))),
    (ProfilePictureUrl::FIELD, |u| {
        u.profile_picture.as_ref().map(|v| v.as_str().into())
    }),
    ("slogan", |u| u.slogan.as_deref().map(Value::from)),
];

/// Build the PATCH body for a profile update. At least one field must be set.
pub fn encode_profile_update(
    update: &ProfileUpdate,
) -> Result<Map<String, Value>, ValidationError> {
    let body = PROFILE_FIELDS
        .iter()
        .filter_map(|(key, get)| get(update).map(|value| ((*key).to_owned(), value)))
        .collect::<Map<_, _>>();
    if body.is_empty() {
        return Err(ValidationError::NothingToUpdate { what: "profile" });
    }
    Ok(body)
}

const DAYS_PER_YEAR: f64 = 365.2425;

/// Age in years on `today`, read from `profile.date_of_birth` and rounded to one decimal.
///
/// A missing or malformed birth date yields `0.0`.
pub fn decode_age(body: &Value, today: NaiveDate) -> f64 {
    let born = body
        .get("profile")
        .and_then(|profile| profile.get(BirthDate::FIELD))
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());
    let Some(born) = born else {
        return 0.0;
    };
    let years = (today - born).num_days() as f64 / DAYS_PER_YEAR;
    (years * 10.0).round() / 10.0
}
