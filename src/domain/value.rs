use std::fmt;

use phonenumber::country;
use url::Url;

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Canonical phone number: international digits only, no `+`, no separators.
///
/// Invariant: 9 to 15 digits. The Me backend keys accounts and credentials by this value.
pub struct PhoneNumber(u64);

impl PhoneNumber {
    /// JSON field name used by the Me API (`phone_number`).
    pub const FIELD: &'static str = "phone_number";

    /// Minimum number of digits accepted by [`PhoneNumber::normalize`].
    pub const MIN_DIGITS: usize = 9;

    /// Maximum number of digits accepted by [`PhoneNumber::normalize`].
    pub const MAX_DIGITS: usize = 15;

    /// Strip every non-digit character and validate the digit count.
    ///
    /// `"+972 (55) 123-4567"` and `"972551234567"` both normalize to `972551234567`.
    pub fn normalize(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let raw = raw.as_ref();
        let digits = raw
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(ValidationError::InvalidPhoneNumber {
                input: raw.to_owned(),
            });
        }

        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidPhoneNumber {
                input: raw.to_owned(),
            })
    }

    /// Parse a possibly national-format number with the `phonenumber` crate, then normalize
    /// its E.164 form.
    ///
    /// `default_region` is used when the input does not contain an explicit country prefix.
    pub fn parse(
        default_region: Option<country::Id>,
        input: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let input = input.into();
        let raw = input.trim();
        if raw.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let parsed = phonenumber::parse(default_region, raw).map_err(|_| {
            ValidationError::InvalidPhoneNumber {
                input: raw.to_owned(),
            }
        })?;
        Self::from_parsed(&parsed)
    }

    /// Convert an already-parsed phone number via its E.164 representation.
    pub fn from_parsed(parsed: &phonenumber::PhoneNumber) -> Result<Self, ValidationError> {
        let e164 = phonenumber::format(parsed)
            .mode(phonenumber::Mode::E164)
            .to_string();
        Self::normalize(e164)
    }

    /// The canonical value as an integer.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// One-time activation code delivered by SMS (or the WhatsApp/Telegram bots).
///
/// Invariant: exactly 6 ASCII digits after trimming.
pub struct ActivationCode(String);

impl ActivationCode {
    /// JSON field name used by the Me API (`activation_code`).
    pub const FIELD: &'static str = "activation_code";

    /// Create a validated [`ActivationCode`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidActivationCode {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Access token sent raw (no `Bearer` prefix) in the `authorization` header.
///
/// Invariant: non-empty after trimming.
pub struct AccessToken(String);

impl AccessToken {
    /// Credential-file field name (`access`).
    pub const FIELD: &'static str = "access";

    /// Create a validated [`AccessToken`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Long-lived refresh or password token used to mint a new [`AccessToken`].
///
/// Invariant: non-empty after trimming.
pub struct RefreshToken(String);

impl RefreshToken {
    /// Credential-file field name (`refresh`).
    pub const FIELD: &'static str = "refresh";

    /// Create a validated [`RefreshToken`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Account id (`uuid`) of a Me user.
///
/// Invariant: non-empty after trimming.
pub struct AccountId(String);

impl AccountId {
    /// JSON field name used by the Me API (`uuid`).
    pub const FIELD: &'static str = "uuid";

    /// Create a validated [`AccountId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Calendar date in `YYYY-MM-DD` form.
pub struct BirthDate(String);

impl BirthDate {
    /// JSON field name used by the Me API (`date_of_birth`).
    pub const FIELD: &'static str = "date_of_birth";

    /// Create a validated [`BirthDate`]. Month must be `01..=12`, day `01..=31`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidDate {
            field: Self::FIELD,
            input: trimmed.to_owned(),
        };

        let parts = trimmed.split('-').collect::<Vec<_>>();
        let [year, month, day] = parts[..] else {
            return Err(invalid());
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return Err(invalid());
        }
        if !all_digits(year) || !all_digits(month) || !all_digits(day) {
            return Err(invalid());
        }
        let month_ok = month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
        let day_ok = day.parse::<u8>().is_ok_and(|d| (1..=31).contains(&d));
        if !month_ok || !day_ok {
            return Err(invalid());
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the date string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// E-mail address, checked loosely as `local@domain.tld` without whitespace.
pub struct Email(String);

impl Email {
    /// JSON field name used by the Me API (`email`).
    pub const FIELD: &'static str = "email";

    /// Create a validated [`Email`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidEmail {
            input: trimmed.to_owned(),
        };

        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
        let Some((host, tld)) = domain.rsplit_once('.') else {
            return Err(invalid());
        };
        if local.is_empty() || host.is_empty() || tld.is_empty() {
            return Err(invalid());
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Numeric Facebook profile id (sent as `facebook_url`).
pub struct FacebookId(String);

impl FacebookId {
    /// JSON field name used by the Me API (`facebook_url`).
    pub const FIELD: &'static str = "facebook_url";

    /// Create a validated [`FacebookId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidFacebookId {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Direct link to a `.png` or `.jpg` image over HTTP(S).
pub struct ProfilePictureUrl(Url);

impl ProfilePictureUrl {
    /// JSON field name used by the Me API (`profile_picture`).
    pub const FIELD: &'static str = "profile_picture";

    /// Create a validated [`ProfilePictureUrl`].
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let value = value.as_ref().trim();
        let invalid = || ValidationError::InvalidUrl {
            field: Self::FIELD,
            input: value.to_owned(),
        };

        let url = Url::parse(value).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }
        let path = url.path().to_ascii_lowercase();
        if !(path.ends_with(".png") || path.ends_with(".jpg")) {
            return Err(invalid());
        }
        Ok(Self(url))
    }

    /// Borrow the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Two-letter country code, stored upper-case (`IL`, `US`, ...).
///
/// Longer inputs are truncated to their first two letters.
pub struct CountryCode(String);

impl CountryCode {
    /// JSON field name used by the Me API (`country_code`).
    pub const FIELD: &'static str = "country_code";

    /// Create a validated [`CountryCode`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let code = value
            .trim()
            .chars()
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if code.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(code))
    }

    /// Borrow the code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_strips_non_digits() {
        let pn = PhoneNumber::normalize("+972 (55) 123-4567").unwrap();
        assert_eq!(pn.as_u64(), 972_551_234_567);
        assert_eq!(pn.to_string(), "972551234567");
    }

    #[test]
    fn phone_number_enforces_digit_bounds() {
        assert!(PhoneNumber::normalize("12345678").is_err());
        assert!(PhoneNumber::normalize("123456789").is_ok());
        assert!(PhoneNumber::normalize("123456789012345").is_ok());
        assert!(PhoneNumber::normalize("1234567890123456").is_err());
        assert!(PhoneNumber::normalize("").is_err());
        assert!(PhoneNumber::normalize("phone: n/a").is_err());
    }

    #[test]
    fn phone_number_counts_digits_not_characters() {
        let pn = PhoneNumber::normalize("9-7-2-5-5-5-5-1-2-3-4").unwrap();
        assert_eq!(pn.as_u64(), 97_255_551_234);
        assert!(PhoneNumber::normalize("1-2-3-4-5-6-7-8").is_err());
    }

    #[test]
    fn phone_number_normalize_is_idempotent() {
        for raw in ["9725551234", "+1 (650) 253-0000", "447911123456"] {
            let once = PhoneNumber::normalize(raw).unwrap();
            let twice = PhoneNumber::normalize(once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn phone_number_parse_uses_region() {
        let pn = PhoneNumber::parse(Some(country::Id::US), "(650) 253-0000").unwrap();
        assert_eq!(pn.as_u64(), 16_502_530_000);
        assert!(PhoneNumber::parse(None, "  ").is_err());
    }

    #[test]
    fn activation_code_requires_six_digits() {
        assert_eq!(ActivationCode::new(" 123456 ").unwrap().as_str(), "123456");
        assert!(ActivationCode::new("12345").is_err());
        assert!(ActivationCode::new("1234567").is_err());
        assert!(ActivationCode::new("12a456").is_err());
    }

    #[test]
    fn string_newtypes_trim_or_validate() {
        assert_eq!(AccessToken::new(" tok ").unwrap().as_str(), "tok");
        assert!(AccessToken::new("  ").is_err());
        assert_eq!(RefreshToken::new("r").unwrap().as_str(), "r");
        assert!(RefreshToken::new("").is_err());
        assert_eq!(AccountId::new(" abc ").unwrap().as_str(), "abc");
        assert!(AccountId::new("").is_err());
    }

    #[test]
    fn birth_date_checks_shape_and_ranges() {
        assert!(BirthDate::new("1990-12-31").is_ok());
        assert!(BirthDate::new("1990-13-01").is_err());
        assert!(BirthDate::new("1990-00-10").is_err());
        assert!(BirthDate::new("1990-01-32").is_err());
        assert!(BirthDate::new("90-01-01").is_err());
        assert!(BirthDate::new("1990/01/01").is_err());
    }

    #[test]
    fn email_is_checked_loosely() {
        assert!(Email::new("name@domain.com").is_ok());
        assert!(Email::new("name@domain").is_err());
        assert!(Email::new("name domain@x.com").is_err());
        assert!(Email::new("@domain.com").is_err());
    }

    #[test]
    fn profile_picture_url_requires_image_link() {
        assert!(ProfilePictureUrl::new("https://example.com/a/me.jpg").is_ok());
        assert!(ProfilePictureUrl::new("http://example.com/me.PNG").is_ok());
        assert!(ProfilePictureUrl::new("https://example.com/me.gif").is_err());
        assert!(ProfilePictureUrl::new("ftp://example.com/me.jpg").is_err());
        assert!(ProfilePictureUrl::new("not a url").is_err());
    }

    #[test]
    fn country_code_is_upper_cased_and_truncated() {
        assert_eq!(CountryCode::new("il").unwrap().as_str(), "IL");
        assert_eq!(CountryCode::new("usa").unwrap().as_str(), "US");
        assert!(CountryCode::new(" ").is_err());
        assert!(FacebookId::new("24898745174639").is_ok());
        assert!(FacebookId::new("fb.com/me").is_err());
    }
}
