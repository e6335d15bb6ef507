//! Credential store: a JSON file mapping phone numbers to their tokens.
//!
//! The file is an object keyed by phone-number strings:
//!
//! ```json
//! {
//!     "972551234567": {
//!         "access": "...",
//!         "pwd_token": "...",
//!         "refresh": "...",
//!         "uuid": "..."
//!     }
//! }
//! ```
//!
//! Any other fields the backend sent with the tokens sit beside these, untouched.
//!
//! Every operation re-reads the whole file and every write rewrites it, so several
//! processes can share one file (last writer wins, there is no locking).

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AccessToken, AccountId, PhoneNumber, RefreshToken, ValidationError};

/// Default credential file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`CredentialStore`].
pub enum StoreError {
    /// The file could not be created, read, or replaced.
    #[error("failed to access credential store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a JSON object of credential entries.
    #[error("credential store {path} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The credential to save is not acceptable.
    #[error("invalid credential: {0}")]
    Invalid(#[from] ValidationError),

    /// The in-memory mapping could not be encoded.
    #[error("failed to encode credential store: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Tokens stored for one phone number.
///
/// A credential is *complete* when it has both an access token and a refresh token.
pub struct Credential {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
    /// Password token expected by the login endpoint, when the backend issued one.
    pub pwd_token: Option<RefreshToken>,
    pub account_id: Option<AccountId>,
    /// Any other fields the backend returned with the tokens, kept verbatim.
    pub extra: Map<String, Value>,
}

impl Credential {
    /// Both an access and a refresh token are present.
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }

    /// Token to present when minting a new access token.
    pub fn login_token(&self) -> Option<&RefreshToken> {
        self.pwd_token.as_ref().or(self.refresh_token.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pwd_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uuid: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

const KNOWN_FIELDS: [&str; 4] = ["access", "refresh", "pwd_token", "uuid"];

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Self {
            access_token: stored.access.and_then(|v| AccessToken::new(v).ok()),
            refresh_token: stored.refresh.and_then(|v| RefreshToken::new(v).ok()),
            pwd_token: stored.pwd_token.and_then(|v| RefreshToken::new(v).ok()),
            account_id: stored.uuid.and_then(|v| AccountId::new(v).ok()),
            extra: stored.extra,
        }
    }
}

impl From<&Credential> for StoredCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            access: credential.access_token.as_ref().map(|t| t.as_str().to_owned()),
            refresh: credential.refresh_token.as_ref().map(|t| t.as_str().to_owned()),
            pwd_token: credential.pwd_token.as_ref().map(|t| t.as_str().to_owned()),
            uuid: credential.account_id.as_ref().map(|id| id.as_str().to_owned()),
            extra: credential
                .extra
                .iter()
                .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// File-backed credential store. Holds only the path; nothing is cached.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the credential stored for `phone_number`.
    ///
    /// Creates the file as `{}` when it does not exist yet.
    pub fn load(&self, phone_number: PhoneNumber) -> Result<Option<Credential>, StoreError> {
        let entries = self.read_all()?;
        entries
            .get(&phone_number.to_string())
            .map(|entry| self.decode_entry(entry).map(Credential::from))
            .transpose()
    }

    /// Merge `credential` into the entry for `phone_number` and rewrite the file.
    ///
    /// Every token field is overwritten, except that a stored refresh/password token
    /// survives a write that omits it. Extra fields already in the entry are kept unless
    /// the new credential carries the same key. Returns the credential as written.
    pub fn save(
        &self,
        phone_number: PhoneNumber,
        credential: Credential,
    ) -> Result<Credential, StoreError> {
        if credential.access_token.is_none() && credential.refresh_token.is_none() {
            return Err(ValidationError::MissingTokens.into());
        }

        let mut entries = self.read_all()?;
        let key = phone_number.to_string();
        let previous = entries
            .get(&key)
            .map(|entry| self.decode_entry(entry).map(Credential::from))
            .transpose()?
            .unwrap_or_default();

        let mut merged = credential;
        if merged.refresh_token.is_none() {
            merged.refresh_token = previous.refresh_token;
        }
        if merged.pwd_token.is_none() {
            merged.pwd_token = previous.pwd_token;
        }
        for (key, value) in previous.extra {
            merged.extra.entry(key).or_insert(value);
        }

        let entry = serde_json::to_value(StoredCredential::from(&merged))
            .map_err(StoreError::Serialize)?;
        entries.insert(key, entry);
        self.write_all(&entries)?;

        tracing::debug!(path = %self.path.display(), %phone_number, "credential saved");
        Ok(merged)
    }

    /// Drop the entry for `phone_number`. Returns whether an entry existed.
    pub fn remove(&self, phone_number: PhoneNumber) -> Result<bool, StoreError> {
        let mut entries = self.read_all()?;
        let existed = entries.remove(&phone_number.to_string()).is_some();
        if existed {
            self.write_all(&entries)?;
            tracing::debug!(path = %self.path.display(), %phone_number, "credential removed");
        }
        Ok(existed)
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.is_file() {
            tracing::debug!(path = %self.path.display(), "creating empty credential store");
            fs::write(&self.path, "{}").map_err(|source| self.io_error(source))?;
        }

        let content = fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                source: None,
            }),
            Err(source) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                source: Some(source),
            }),
        }
    }

    fn write_all(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        entries
            .serialize(&mut serializer)
            .map_err(StoreError::Serialize)?;

        let mut temp_path = OsString::from(self.path.as_os_str());
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        if let Err(source) = fs::write(&temp_path, &content) {
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(source));
        }
        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            self.io_error(source)
        })
    }

    fn decode_entry(&self, entry: &Value) -> Result<StoredCredential, StoreError> {
        StoredCredential::deserialize(entry).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source: Some(source),
        })
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}
