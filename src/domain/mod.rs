//! Domain layer: strong types with validation and invariants (no I/O).

mod request;
mod response;
mod validation;
mod value;

pub use request::{
    CallLogEntry, CallType, Contact, Coordinates, DeviceType, Gender, LoginType,
    NewAccountDetails, NotificationCategory, NotificationQuery, NotificationSettingsUpdate,
    ProfileUpdate, SocialLink, SocialNetwork, SocialSettingsUpdate,
};
pub use response::{SocialOutcome, UpdateOutcome};
pub use validation::ValidationError;
pub use value::{
    AccessToken, AccountId, ActivationCode, BirthDate, CountryCode, Email, FacebookId,
    PhoneNumber, ProfilePictureUrl, RefreshToken,
};
