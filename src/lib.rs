//! Typed Rust client for the Me caller-id app HTTP API.
//!
//! The crate is split into a domain layer of strong types, a credential store, a session
//! layer that activates and refreshes tokens, a transport layer for wire-format quirks,
//! and a client layer that dispatches requests and retries once the token is renewed.
//!
//! ```rust,no_run
//! use meapi::{Auth, MeClient, PhoneNumber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), meapi::MeError> {
//!     let mut client = MeClient::builder(Auth::phone_number("+972 55-123-4567")?)
//!         .config_file("me.json")
//!         .build()?;
//!     let found = client
//!         .phone_search(PhoneNumber::normalize("972541234567")?)
//!         .await?;
//!     println!("{found:?}");
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod domain;
pub mod session;
pub mod store;
mod transport;

pub use client::error::{ActivationErrorKind, ApiError, MeError, RefreshErrorKind};
pub use client::{Auth, MeClient, MeClientBuilder, Method};
pub use domain::{
    AccessToken, AccountId, ActivationCode, BirthDate, CallLogEntry, CallType, Contact,
    Coordinates, CountryCode, DeviceType, Email, FacebookId, Gender, LoginType,
    NewAccountDetails, NotificationCategory, NotificationQuery, NotificationSettingsUpdate,
    PhoneNumber, ProfilePictureUrl, ProfileUpdate, RefreshToken, SocialLink, SocialNetwork,
    SocialOutcome, SocialSettingsUpdate, UpdateOutcome, ValidationError,
};
pub use session::{CredentialPrompter, Session, SessionState};
pub use store::{Credential, CredentialStore, StoreError};
