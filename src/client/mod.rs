//! Client layer: owns the session, dispatches requests and re-authorizes on HTTP 403.

mod account;
pub(crate) mod error;
pub(crate) mod http;
mod notifications;
mod settings;
mod social;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::client::error::{ActivationErrorKind, MeError, RefreshErrorKind};
use crate::client::http::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, Dispatcher, ReqwestTransport};
use crate::domain::{AccessToken, AccountId, ActivationCode, PhoneNumber, ValidationError};
use crate::session::{CredentialPrompter, Session, SessionManager, SessionState};
use crate::store::{CredentialStore, DEFAULT_CONFIG_FILE};

pub use http::Method;

/// Sends per logical request, refreshes included between them.
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
/// How the client identifies itself to the Me backend.
///
/// Use [`Auth::phone_number`] for a full session (credential file, activation, refresh), or
/// [`Auth::access_token`] when a token was obtained elsewhere. Bare-token sessions never
/// refresh: an HTTP 403 is returned to the caller as is.
pub enum Auth {
    PhoneNumber(PhoneNumber),
    AccessToken {
        token: AccessToken,
        account_id: Option<AccountId>,
    },
}

impl Auth {
    /// Create [`Auth::PhoneNumber`] from any common phone number notation.
    pub fn phone_number(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        Ok(Self::PhoneNumber(PhoneNumber::normalize(raw)?))
    }

    /// Create [`Auth::AccessToken`]; `account_id` is the token owner's `uuid`, when known.
    pub fn access_token(
        token: impl Into<String>,
        account_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        Ok(Self::AccessToken {
            token: AccessToken::new(token)?,
            account_id: account_id.map(AccountId::new).transpose()?,
        })
    }
}

#[derive(Clone)]
/// Builder for [`MeClient`].
///
/// Use this when you need a custom endpoint, credential file, timeout, proxy, user-agent,
/// or an interactive [`CredentialPrompter`].
pub struct MeClientBuilder {
    auth: Auth,
    base_url: String,
    config_file: PathBuf,
    timeout: Option<Duration>,
    user_agent: String,
    proxy: Option<String>,
    prompter: Option<Arc<dyn CredentialPrompter>>,
}

impl fmt::Debug for MeClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeClientBuilder")
            .field("auth", &self.auth)
            .field("base_url", &self.base_url)
            .field("config_file", &self.config_file)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("proxy", &self.proxy)
            .field("prompter", &self.prompter.is_some())
            .finish()
    }
}

impl MeClientBuilder {
    /// Create a builder with the default endpoint, `config.json` and no timeout.
    pub fn new(auth: Auth) -> Self {
        Self {
            auth,
            base_url: DEFAULT_BASE_URL.to_owned(),
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            proxy: None,
            prompter: None,
        }
    }

    /// Override the API base URL (`https://app.mobile.me.app`).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Credential file location. Paths not ending in `.json` are ignored with a warning.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.extension().is_some_and(|ext| ext == "json") {
            self.config_file = path;
        } else {
            tracing::warn!(
                path = %path.display(),
                fallback = DEFAULT_CONFIG_FILE,
                "credential file must be a .json file, using default"
            );
            self.config_file = PathBuf::from(DEFAULT_CONFIG_FILE);
        }
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Route all requests through a proxy (`http://`, `https://` or `socks5://` URL).
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Source of activation codes and new-account details.
    ///
    /// Without a prompter, [`MeClient::authenticate`] fails with
    /// [`ActivationErrorKind::CodeRequired`] and new numbers cannot be registered.
    pub fn prompter(mut self, prompter: Arc<dyn CredentialPrompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    /// Build a [`MeClient`] and load the stored credential. No request is sent.
    pub fn build(self) -> Result<MeClient, MeError> {
        let base_url = Url::parse(&self.base_url)?;

        let mut builder = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|err| MeError::Build(Box::new(err)))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|err| MeError::Build(Box::new(err)))?;

        let dispatcher = Dispatcher::new(base_url, Arc::new(ReqwestTransport { client }));
        MeClient::from_parts(self.auth, dispatcher, self.config_file, self.prompter)
    }

    /// Build the client, then run [`MeClient::authenticate`].
    pub async fn connect(self) -> Result<MeClient, MeError> {
        let mut client = self.build()?;
        client.authenticate().await?;
        Ok(client)
    }
}

/// Client for the Me caller-id backend.
///
/// Every call takes `&mut self`: one client never has two requests in flight, and a
/// refresh triggered by HTTP 403 completes before the next call starts.
pub struct MeClient {
    dispatcher: Dispatcher,
    session: Session,
    /// `None` for bare-token sessions.
    manager: Option<SessionManager>,
}

impl fmt::Debug for MeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeClient")
            .field("base_url", &self.dispatcher.base_url().as_str())
            .field("phone_number", &self.session.phone_number())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl MeClient {
    /// Create a client with default settings.
    ///
    /// For more customization, use [`MeClient::builder`].
    pub fn new(auth: Auth) -> Result<Self, MeError> {
        MeClientBuilder::new(auth).build()
    }

    /// Start building a client with custom settings.
    pub fn builder(auth: Auth) -> MeClientBuilder {
        MeClientBuilder::new(auth)
    }

    fn from_parts(
        auth: Auth,
        dispatcher: Dispatcher,
        config_file: PathBuf,
        prompter: Option<Arc<dyn CredentialPrompter>>,
    ) -> Result<Self, MeError> {
        match auth {
            Auth::PhoneNumber(phone_number) => {
                let mut session = Session::for_phone_number(phone_number);
                let mut manager =
                    SessionManager::new(phone_number, CredentialStore::new(config_file), prompter);
                manager.bootstrap(&mut session)?;
                Ok(Self {
                    dispatcher,
                    session,
                    manager: Some(manager),
                })
            }
            Auth::AccessToken { token, account_id } => Ok(Self {
                dispatcher,
                session: Session::for_access_token(token, account_id),
                manager: None,
            }),
        }
    }

    /// Tokens and account id currently held by the client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Bare-token sessions always report [`SessionState::Authenticated`].
    pub fn state(&self) -> SessionState {
        self.manager
            .as_ref()
            .map_or(SessionState::Authenticated, SessionManager::state)
    }

    /// Base URL every request path is appended to.
    pub fn base_url(&self) -> &Url {
        self.dispatcher.base_url()
    }

    /// Credential file backing a phone-number session.
    pub fn config_file(&self) -> Option<&Path> {
        self.manager.as_ref().map(|manager| manager.store().path())
    }

    /// Make sure the session holds a token, asking the prompter for activation codes.
    ///
    /// A rejected code is reported to the prompter with the next attempt number. Returns
    /// immediately when already authenticated.
    pub async fn authenticate(&mut self) -> Result<(), MeError> {
        let Some(manager) = self.manager.as_mut() else {
            return Ok(());
        };
        if manager.state() == SessionState::Authenticated {
            return Ok(());
        }
        let Some(prompter) = manager.prompter() else {
            return Err(MeError::Activation {
                kind: ActivationErrorKind::CodeRequired,
                source: None,
            });
        };

        let phone_number = manager.phone_number();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(code) = prompter.activation_code(phone_number, attempt) else {
                return Err(MeError::Activation {
                    kind: ActivationErrorKind::Cancelled,
                    source: None,
                });
            };
            match manager
                .activate(&self.dispatcher, &mut self.session, code)
                .await
            {
                Err(MeError::Activation {
                    kind: ActivationErrorKind::IncorrectCode,
                    ..
                }) => continue,
                other => return other,
            }
        }
    }

    /// Exchange an activation code for a fresh credential.
    pub async fn activate(&mut self, code: ActivationCode) -> Result<(), MeError> {
        let Some(manager) = self.manager.as_mut() else {
            return Err(MeError::Activation {
                kind: ActivationErrorKind::NoPhoneNumber,
                source: None,
            });
        };
        manager
            .activate(&self.dispatcher, &mut self.session, code)
            .await
    }

    /// Mint a new access token now instead of waiting for an HTTP 403.
    pub async fn refresh(&mut self) -> Result<(), MeError> {
        let Some(manager) = self.manager.as_mut() else {
            return Err(MeError::Refresh {
                kind: RefreshErrorKind::MissingCredential,
                source: None,
            });
        };
        manager.refresh(&self.dispatcher, &mut self.session).await
    }

    /// Send one logical request and return the parsed JSON body.
    ///
    /// `path` is appended to the base URL and may carry a query string. With `use_auth`, the
    /// held access token goes into the `authorization` header. In a phone-number session any
    /// HTTP 403 triggers a refresh and a retry, for at most three sends in total, whether or
    /// not the request carried the token.
    ///
    /// Errors:
    /// - [`MeError::RequestExhausted`] when the request is still rejected with 403, or the
    ///   refresh in between was rejected (kept as the error source),
    /// - [`MeError::Api`] for every other status >= 400,
    /// - [`MeError::Transport`] / [`MeError::MalformedResponse`], never retried.
    pub async fn dispatch(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        use_auth: bool,
    ) -> Result<Value, MeError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let token = if use_auth {
                self.session.access_token.as_ref()
            } else {
                None
            };
            let response = self.dispatcher.send(method, path, body, token).await?;
            if response.status != 403 {
                return response.into_result();
            }
            let Some(manager) = self.manager.as_mut() else {
                return response.into_result();
            };
            if attempts >= MAX_ATTEMPTS {
                tracing::warn!(%method, path, attempts, "giving up on unauthorized request");
                return Err(MeError::RequestExhausted {
                    method,
                    path: path.to_owned(),
                    attempts,
                    source: None,
                });
            }

            tracing::warn!(%method, path, attempt = attempts, "access token rejected, refreshing");
            match manager.refresh(&self.dispatcher, &mut self.session).await {
                Ok(()) => {}
                Err(err @ (MeError::Refresh { .. } | MeError::Api(_))) => {
                    return Err(MeError::RequestExhausted {
                        method,
                        path: path.to_owned(),
                        attempts,
                        source: Some(Box::new(err)),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) async fn get(&mut self, path: &str) -> Result<Value, MeError> {
        self.dispatch(Method::Get, path, None, true).await
    }

    pub(crate) async fn post(&mut self, path: &str, body: &Value) -> Result<Value, MeError> {
        self.dispatch(Method::Post, path, Some(body), true).await
    }
}

/// Read a field a typed wrapper depends on.
pub(crate) fn required<T>(
    body: &Value,
    field: &'static str,
    read: impl FnOnce(&Value, &str) -> Option<T>,
) -> Result<T, MeError> {
    read(body, field).ok_or(MeError::UnexpectedResponse { field })
}
