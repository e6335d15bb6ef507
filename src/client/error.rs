use std::error::Error as StdError;
use std::fmt;

use serde_json::Value;

use crate::client::http::Method;
use crate::domain::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("HTTP {status}: {message}")]
/// Non-2xx answer from the Me backend.
///
/// `message` is the body's `detail` field when present, otherwise the whole parsed body.
pub struct ApiError {
    pub status: u16,
    pub message: Value,
    /// Human-readable reason: the HTTP reason phrase, or a hint for well-known failures.
    pub reason: Option<String>,
}

impl ApiError {
    pub(crate) fn from_body(status: u16, reason: Option<String>, body: Value) -> Self {
        let message = match body {
            Value::Object(mut map) if map.contains_key("detail") => {
                map.remove("detail").unwrap_or(Value::Null)
            }
            other => other,
        };
        Self {
            status,
            message,
            reason,
        }
    }

    /// The message as a string, when the backend sent a plain string.
    pub fn message_str(&self) -> Option<&str> {
        self.message.as_str()
    }

    /// Returns `true` when the status matches and the message equals `code`.
    pub fn is(&self, status: u16, code: &str) -> bool {
        self.status == status && self.message_str() == Some(code)
    }

    pub(crate) fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Why an activation exchange failed.
pub enum ActivationErrorKind {
    /// The backend rejected the code. Ask for a new one and retry.
    IncorrectCode,
    /// The backend accepted the code but sent no access token.
    MissingAccessToken,
    /// An activation is needed but no prompter is configured.
    CodeRequired,
    /// The prompter gave up without providing a code.
    Cancelled,
    /// The client was built from a bare access token; there is no number to activate.
    NoPhoneNumber,
}

impl fmt::Display for ActivationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IncorrectCode => "incorrect activation code",
            Self::MissingAccessToken => "no access token in activation response",
            Self::CodeRequired => "activation code required",
            Self::Cancelled => "activation cancelled",
            Self::NoPhoneNumber => "session has no phone number",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Why a token refresh failed. Every kind leaves the session pending activation.
pub enum RefreshErrorKind {
    /// The stored refresh/password token was rejected, usually because the account was
    /// activated again elsewhere.
    BrokenRefreshToken,
    /// The credential store has no refresh token for this phone number.
    MissingCredential,
    /// The backend accepted the refresh token but sent no access token.
    MissingAccessToken,
}

impl fmt::Display for RefreshErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BrokenRefreshToken => "refresh token rejected",
            Self::MissingCredential => "no stored refresh token",
            Self::MissingAccessToken => "no access token in login response",
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`MeClient`](crate::MeClient).
pub enum MeError {
    /// Input rejected before any request was sent.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The activation code exchange failed.
    #[error("activation failed: {kind}")]
    Activation {
        kind: ActivationErrorKind,
        #[source]
        source: Option<ApiError>,
    },

    /// The refresh token exchange failed; a new activation is required.
    #[error("token refresh failed: {kind}")]
    Refresh {
        kind: RefreshErrorKind,
        #[source]
        source: Option<ApiError>,
    },

    /// Non-2xx response unrelated to re-authorization.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Response body is not JSON.
    #[error("malformed response (HTTP {status}): {body}")]
    MalformedResponse {
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request kept failing with HTTP 403 after re-authorization attempts.
    ///
    /// `source` holds the refresh failure when the refresh itself was rejected.
    #[error("{method} {path} still unauthorized after {attempts} attempt(s)")]
    RequestExhausted {
        method: Method,
        path: String,
        attempts: u32,
        #[source]
        source: Option<Box<MeError>>,
    },

    /// Reading or writing the credential file failed.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// A successful response lacks a field this client needs.
    #[error("response is missing field `{field}`")]
    UnexpectedResponse { field: &'static str },

    /// The configured base URL or a request path is not a valid URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The HTTP client could not be built (TLS backend, proxy, ...).
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] Box<dyn StdError + Send + Sync>),
}
