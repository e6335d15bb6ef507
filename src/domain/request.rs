use url::Url;

use crate::domain::validation::ValidationError;
use crate::domain::value::{
    BirthDate, CountryCode, Email, FacebookId, PhoneNumber, ProfilePictureUrl,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Android,
    Ios,
}

impl DeviceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginType {
    Email,
}

impl LoginType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Profile gender. [`Gender::Unspecified`] clears the value (sent as `null`).
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub fn as_wire(self) -> Option<&'static str> {
        match self {
            Self::Male => Some("M"),
            Self::Female => Some("F"),
            Self::Unspecified => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// Fields to change on the caller's profile. Only `Some` fields are sent.
pub struct ProfileUpdate {
    pub country_code: Option<CountryCode>,
    pub date_of_birth: Option<BirthDate>,
    pub device_type: Option<DeviceType>,
    pub login_type: Option<LoginType>,
    pub email: Option<Email>,
    pub facebook_id: Option<FacebookId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub profile_picture: Option<ProfilePictureUrl>,
    pub slogan: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// Social/privacy settings to change. Only `Some` fields are sent.
pub struct SocialSettingsUpdate {
    pub mutual_contacts_available: Option<bool>,
    pub who_watched_enabled: Option<bool>,
    pub who_deleted_enabled: Option<bool>,
    pub comments_enabled: Option<bool>,
    pub location_enabled: Option<bool>,
    /// Notification language code (`iw`, `en`, ...).
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// Notification toggles to change. Only `Some` fields are sent.
pub struct NotificationSettingsUpdate {
    pub who_deleted_notification_enabled: Option<bool>,
    pub who_watched_notification_enabled: Option<bool>,
    pub distance_notification_enabled: Option<bool>,
    pub system_notification_enabled: Option<bool>,
    pub birthday_notification_enabled: Option<bool>,
    pub comments_notification_enabled: Option<bool>,
    pub names_notification_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Details used to register a brand new account after activation.
pub struct NewAccountDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
}

impl From<NewAccountDetails> for ProfileUpdate {
    fn from(details: NewAccountDetails) -> Self {
        Self {
            first_name: Some(details.first_name),
            last_name: Some(details.last_name),
            email: details.email,
            login_type: Some(LoginType::Email),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Address-book entry uploaded with contacts sync.
pub struct Contact {
    name: String,
    phone_number: PhoneNumber,
    pub country_code: Option<CountryCode>,
    pub date_of_birth: Option<BirthDate>,
}

impl Contact {
    pub const NAME_FIELD: &'static str = "name";

    pub fn new(
        name: impl Into<String>,
        phone_number: PhoneNumber,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: Self::NAME_FIELD,
            });
        }
        Ok(Self {
            name,
            phone_number,
            country_code: None,
            date_of_birth: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone_number(&self) -> PhoneNumber {
        self.phone_number
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    Incoming,
    Missed,
    Outgoing,
}

impl CallType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Missed => "missed",
            Self::Outgoing => "outgoing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Call-log entry. The display name defaults to the phone number digits.
pub struct CallLogEntry {
    pub name: String,
    pub phone_number: PhoneNumber,
    pub call_type: CallType,
    pub duration_seconds: u32,
    pub tag: Option<String>,
    /// RFC 3339 timestamp, e.g. `2021-07-29T11:27:50Z`.
    pub called_at: String,
}

impl CallLogEntry {
    pub fn new(
        phone_number: PhoneNumber,
        call_type: CallType,
        called_at: impl Into<String>,
    ) -> Self {
        Self {
            name: phone_number.to_string(),
            phone_number,
            call_type,
            duration_seconds: 0,
            tag: None,
            called_at: called_at.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialNetwork {
    Twitter,
    Spotify,
    Instagram,
    Facebook,
    Pinterest,
    Linkedin,
}

impl SocialNetwork {
    pub const ALL: [Self; 6] = [
        Self::Twitter,
        Self::Spotify,
        Self::Instagram,
        Self::Facebook,
        Self::Pinterest,
        Self::Linkedin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Spotify => "spotify",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Pinterest => "pinterest",
            Self::Linkedin => "linkedin",
        }
    }

    /// Networks linked by pasting a profile URL; the others use an OAuth code.
    pub fn uses_profile_url(self) -> bool {
        matches!(self, Self::Pinterest | Self::Linkedin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A social network to connect to the caller's profile.
pub enum SocialLink {
    /// OAuth code obtained from the network's authorization page.
    AuthCode { network: SocialNetwork, code: String },
    /// Public profile URL.
    ProfileUrl { network: SocialNetwork, url: Url },
}

impl SocialLink {
    pub fn auth_code(
        network: SocialNetwork,
        code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if network.uses_profile_url() {
            return Err(ValidationError::UnsupportedSocialLink {
                network: network.as_str(),
            });
        }
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "code_first",
            });
        }
        Ok(Self::AuthCode { network, code })
    }

    /// The URL must be HTTP(S) and mention the network's domain.
    pub fn profile_url(
        network: SocialNetwork,
        url: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        if !network.uses_profile_url() {
            return Err(ValidationError::UnsupportedSocialLink {
                network: network.as_str(),
            });
        }
        let raw = url.as_ref().trim();
        let invalid = || ValidationError::InvalidUrl {
            field: network.as_str(),
            input: raw.to_owned(),
        };
        let url = Url::parse(raw).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || !url.as_str().contains(network.as_str()) {
            return Err(invalid());
        }
        Ok(Self::ProfileUrl { network, url })
    }

    pub fn network(&self) -> SocialNetwork {
        match self {
            Self::AuthCode { network, .. } | Self::ProfileUrl { network, .. } => *network,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Notification filter groups understood by the notifications feed.
pub enum NotificationCategory {
    Names,
    System,
    Comments,
    WhoWatch,
    WhoDeleted,
    Birthday,
    Location,
}

impl NotificationCategory {
    /// Backend notification types covered by this category.
    pub fn codes(self) -> &'static [&'static str] {
        match self {
            Self::Names => &[
                "JOINED_ME",
                "CONTACT_ADD",
                "UPDATED_CONTACT",
                "DELETED_CONTACT",
                "NEW_NAME_REQUEST",
                "NEW_NAME_REQUEST_APPROVED",
            ],
            Self::System => &[
                "NAME_SUGGESTION_UPDATED",
                "SPAM_SUGGESTION_APPROVED",
                "TURN_ON_MUTUAL",
                "NONE",
            ],
            Self::Comments => &["NEW_COMMENT", "PUBLISHED_COMMENT", "TURN_ON_COMMENTS"],
            Self::WhoWatch => &["WEEKLY_VISITS"],
            Self::WhoDeleted => &["WEEKLY_DELETED"],
            Self::Birthday => &["BIRTHDAY"],
            Self::Location => &["TURN_ON_LOCATION", "SHARE_LOCATION"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    pub page: u32,
    pub page_size: u32,
    /// Empty means every category.
    pub categories: Vec<NotificationCategory>,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(ValidationError::InvalidCoordinates {
                input: format!("{latitude},{longitude}"),
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(self) -> f64 {
        self.latitude
    }

    pub fn longitude(self) -> f64 {
        self.longitude
    }
}
