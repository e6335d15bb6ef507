//! Session layer: who the client is, and how it (re)gains an access token.
//!
//! A phone-number session starts in [`SessionState::PendingActivation`] unless the credential
//! store already holds a complete credential. Activation and refresh both move it to
//! [`SessionState::Authenticated`]; a rejected refresh token moves it back.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::client::error::{ActivationErrorKind, MeError, RefreshErrorKind};
use crate::client::http::{Dispatcher, Method};
use crate::domain::{
    AccessToken, AccountId, ActivationCode, NewAccountDetails, PhoneNumber, ProfileUpdate,
};
use crate::store::{Credential, CredentialStore};
use crate::transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The credential store has not been consulted yet.
    Unauthenticated,
    /// No usable credential; an activation code is needed.
    PendingActivation,
    /// An access token is held and trusted until the backend rejects it.
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PendingActivation => "pending activation",
            Self::Authenticated => "authenticated",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Identity and token the client currently acts with.
pub struct Session {
    pub(crate) phone_number: Option<PhoneNumber>,
    pub(crate) access_token: Option<AccessToken>,
    pub(crate) account_id: Option<AccountId>,
}

impl Session {
    pub(crate) fn for_phone_number(phone_number: PhoneNumber) -> Self {
        Self {
            phone_number: Some(phone_number),
            ..Default::default()
        }
    }

    pub(crate) fn for_access_token(token: AccessToken, account_id: Option<AccountId>) -> Self {
        Self {
            phone_number: None,
            access_token: Some(token),
            account_id,
        }
    }

    /// `None` for sessions built from a bare access token.
    pub fn phone_number(&self) -> Option<PhoneNumber> {
        self.phone_number
    }

    /// `None` until activation completes, or after a failed refresh.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        self.account_id.as_ref()
    }
}

/// Source of interactive input needed during activation.
///
/// Implementations may block (e.g. read from a terminal). Returning `None` cancels.
pub trait CredentialPrompter: Send + Sync {
    /// Ask for the activation code sent to `phone_number`. `attempt` starts at 1 and grows
    /// after each rejected code.
    fn activation_code(&self, phone_number: PhoneNumber, attempt: u32) -> Option<ActivationCode>;

    /// Ask for the details of a brand new account. The default declines.
    fn new_account_details(&self, phone_number: PhoneNumber) -> Option<NewAccountDetails> {
        let _ = phone_number;
        None
    }
}

/// Drives activation and refresh for a phone-number session.
pub(crate) struct SessionManager {
    phone_number: PhoneNumber,
    store: CredentialStore,
    state: SessionState,
    prompter: Option<Arc<dyn CredentialPrompter>>,
}

impl SessionManager {
    pub(crate) fn new(
        phone_number: PhoneNumber,
        store: CredentialStore,
        prompter: Option<Arc<dyn CredentialPrompter>>,
    ) -> Self {
        Self {
            phone_number,
            store,
            state: SessionState::Unauthenticated,
            prompter,
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn phone_number(&self) -> PhoneNumber {
        self.phone_number
    }

    pub(crate) fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub(crate) fn prompter(&self) -> Option<Arc<dyn CredentialPrompter>> {
        self.prompter.clone()
    }

    /// Load the stored credential into `session`. A complete credential is trusted as is.
    pub(crate) fn bootstrap(&mut self, session: &mut Session) -> Result<SessionState, MeError> {
        let stored = self.store.load(self.phone_number)?;
        match stored {
            Some(credential) if credential.is_complete() => {
                session.access_token = credential.access_token;
                session.account_id = credential.account_id;
                self.state = SessionState::Authenticated;
            }
            _ => {
                session.access_token = None;
                self.state = SessionState::PendingActivation;
            }
        }
        tracing::info!(phone_number = %self.phone_number, state = %self.state, "session loaded");
        Ok(self.state)
    }

    /// Exchange an activation code for tokens, then resolve and persist the account id.
    pub(crate) async fn activate(
        &mut self,
        dispatcher: &Dispatcher,
        session: &mut Session,
        code: ActivationCode,
    ) -> Result<(), MeError> {
        let body = transport::encode_activation(self.phone_number, &code);
        let response = dispatcher
            .send(Method::Post, transport::ACTIVATE_PATH, Some(&body), None)
            .await?;
        let body = match response.into_result() {
            Ok(body) => body,
            Err(MeError::Api(api)) if api.is(400, transport::INCORRECT_ACTIVATION_CODE) => {
                tracing::warn!(phone_number = %self.phone_number, "activation code rejected");
                return Err(MeError::Activation {
                    kind: ActivationErrorKind::IncorrectCode,
                    source: Some(api.with_reason("incorrect activation code")),
                });
            }
            Err(err) => return Err(err),
        };

        let grant = transport::decode_token_grant(&body);
        let Some(access_token) = grant.access else {
            return Err(MeError::Activation {
                kind: ActivationErrorKind::MissingAccessToken,
                source: None,
            });
        };

        // Persist before the profile lookup so a failed lookup does not burn the code.
        let credential = self.store.save(
            self.phone_number,
            Credential {
                access_token: Some(access_token.clone()),
                refresh_token: grant.refresh,
                pwd_token: grant.pwd_token,
                account_id: None,
                extra: grant.extra,
            },
        )?;
        session.access_token = Some(access_token);
        self.state = SessionState::Authenticated;
        tracing::info!(phone_number = %self.phone_number, "activated");

        let account_id = self.resolve_account_id(dispatcher, session).await?;
        self.store.save(
            self.phone_number,
            Credential {
                account_id: Some(account_id.clone()),
                ..credential
            },
        )?;
        session.account_id = Some(account_id);
        Ok(())
    }

    /// Mint a new access token from the stored refresh (or password) token.
    pub(crate) async fn refresh(
        &mut self,
        dispatcher: &Dispatcher,
        session: &mut Session,
    ) -> Result<(), MeError> {
        let stored = self.store.load(self.phone_number)?.unwrap_or_default();
        let Some(login_token) = stored.login_token().cloned() else {
            self.require_activation(session);
            return Err(MeError::Refresh {
                kind: RefreshErrorKind::MissingCredential,
                source: None,
            });
        };

        let body = transport::encode_login(self.phone_number, &login_token);
        let response = dispatcher
            .send(Method::Post, transport::LOGIN_PATH, Some(&body), None)
            .await?;
        let body = match response.into_result() {
            Ok(body) => body,
            Err(MeError::Api(api)) if api.is(400, transport::INCORRECT_PWD_TOKEN) => {
                self.require_activation(session);
                return Err(MeError::Refresh {
                    kind: RefreshErrorKind::BrokenRefreshToken,
                    source: Some(api.with_reason(
                        "refresh token rejected; the number was probably activated elsewhere",
                    )),
                });
            }
            Err(err) => return Err(err),
        };

        let grant = transport::decode_token_grant(&body);
        let Some(access_token) = grant.access else {
            self.require_activation(session);
            return Err(MeError::Refresh {
                kind: RefreshErrorKind::MissingAccessToken,
                source: None,
            });
        };

        let credential = self.store.save(
            self.phone_number,
            Credential {
                access_token: Some(access_token),
                refresh_token: grant.refresh,
                pwd_token: grant.pwd_token,
                account_id: session.account_id.clone().or(stored.account_id),
                extra: grant.extra,
            },
        )?;
        session.access_token = credential.access_token;
        session.account_id = credential.account_id;
        self.state = SessionState::Authenticated;
        tracing::info!(phone_number = %self.phone_number, "access token refreshed");
        Ok(())
    }

    /// Look up the caller's account id, registering a new account when the number has none.
    async fn resolve_account_id(
        &self,
        dispatcher: &Dispatcher,
        session: &Session,
    ) -> Result<AccountId, MeError> {
        let token = session.access_token.as_ref();
        let response = dispatcher
            .send(Method::Get, transport::PROFILE_ME_PATH, None, token)
            .await?;
        let api = match response.into_result() {
            Ok(body) => return decode_account_id(&body),
            Err(MeError::Api(api)) if api.is(401, transport::USER_NOT_FOUND) => api,
            Err(err) => return Err(err),
        };

        let details = self
            .prompter
            .as_ref()
            .and_then(|prompter| prompter.new_account_details(self.phone_number));
        let Some(details) = details else {
            return Err(api.with_reason("no account for this number").into());
        };

        tracing::info!(phone_number = %self.phone_number, "registering new account");
        let body = Value::Object(transport::encode_profile_update(&ProfileUpdate::from(details))?);
        dispatcher
            .send(Method::Patch, transport::PROFILE_PATH, Some(&body), token)
            .await?
            .into_result()?;

        let body = dispatcher
            .send(Method::Get, transport::PROFILE_ME_PATH, None, token)
            .await?
            .into_result()?;
        decode_account_id(&body)
    }

    fn require_activation(&mut self, session: &mut Session) {
        tracing::warn!(phone_number = %self.phone_number, "new activation required");
        session.access_token = None;
        self.state = SessionState::PendingActivation;
    }
}

fn decode_account_id(body: &Value) -> Result<AccountId, MeError> {
    transport::decode_account_id(body).ok_or(MeError::UnexpectedResponse {
        field: AccountId::FIELD,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::client::http::fake::FakeTransport;
    use crate::domain::Email;

    fn phone() -> PhoneNumber {
        PhoneNumber::normalize("9725551234").unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("config.json"))
    }

    fn read_file(store: &CredentialStore) -> Value {
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap()
    }

    fn code() -> ActivationCode {
        ActivationCode::new("123456").unwrap()
    }

    #[derive(Default)]
    struct NewUser {
        asked: Mutex<u32>,
    }

    impl CredentialPrompter for NewUser {
        fn activation_code(&self, _: PhoneNumber, _: u32) -> Option<ActivationCode> {
            None
        }

        fn new_account_details(&self, _: PhoneNumber) -> Option<NewAccountDetails> {
            *self.asked.lock().unwrap() += 1;
            Some(NewAccountDetails {
                first_name: "Dana".to_owned(),
                last_name: "Levi".to_owned(),
                email: Some(Email::new("dana@example.com").unwrap()),
            })
        }
    }

    #[test]
    fn bootstrap_without_file_requires_activation() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        let state = manager.bootstrap(&mut session).unwrap();
        assert_eq!(state, SessionState::PendingActivation);
        assert_eq!(session.access_token(), None);
        assert_eq!(read_file(manager.store()), json!({}));
    }

    #[test]
    fn bootstrap_trusts_complete_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"9725551234": {"access": "A", "refresh": "R", "uuid": "u-1"}}"#,
        )
        .unwrap();
        let mut manager = SessionManager::new(phone(), store, None);
        let mut session = Session::for_phone_number(phone());

        assert_eq!(
            manager.bootstrap(&mut session).unwrap(),
            SessionState::Authenticated
        );
        assert_eq!(session.access_token().unwrap().as_str(), "A");
        assert_eq!(session.account_id().unwrap().as_str(), "u-1");
    }

    #[test]
    fn bootstrap_with_partial_credential_requires_activation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"9725551234": {"access": "A"}}"#).unwrap();
        let mut manager = SessionManager::new(phone(), store, None);

        assert_eq!(
            manager.bootstrap(&mut Session::for_phone_number(phone())).unwrap(),
            SessionState::PendingActivation
        );
    }

    #[tokio::test]
    async fn activate_persists_tokens_and_account_id() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"access": "A", "refresh": "R", "user_id": 7}))
            .respond_json(200, json!({"uuid": "u-1", "first_name": "Dana"}));
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());
        manager.bootstrap(&mut session).unwrap();

        manager
            .activate(&transport.dispatcher(), &mut session, code())
            .await
            .unwrap();

        assert_eq!(manager.state(), SessionState::Authenticated);
        assert_eq!(session.access_token().unwrap().as_str(), "A");
        assert_eq!(session.account_id().unwrap().as_str(), "u-1");
        assert_eq!(
            read_file(manager.store()),
            json!({"9725551234": {"access": "A", "refresh": "R", "user_id": 7, "uuid": "u-1"}})
        );

        let requests = transport.requests();
        assert_eq!(requests[0].path(), "/auth/authorization/activate/");
        assert_eq!(requests[0].authorization, None);
        assert_eq!(
            requests[0].body,
            Some(json!({
                "activation_code": "123456",
                "activation_type": "sms",
                "phone_number": 9_725_551_234_u64,
            }))
        );
        assert_eq!(requests[1].path(), "/main/users/profile/me/");
        assert_eq!(requests[1].authorization.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn incorrect_code_keeps_session_pending() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.respond_json(400, json!({"detail": "api_incorrect_activation_code"}));
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());
        manager.bootstrap(&mut session).unwrap();

        let err = manager
            .activate(&transport.dispatcher(), &mut session, code())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeError::Activation {
                kind: ActivationErrorKind::IncorrectCode,
                source: Some(_)
            }
        ));
        assert_eq!(manager.state(), SessionState::PendingActivation);
        assert_eq!(read_file(manager.store()), json!({}));
    }

    #[tokio::test]
    async fn activation_without_access_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({"refresh": "R"}));
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());

        let err = manager
            .activate(&transport.dispatcher(), &mut session, code())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeError::Activation {
                kind: ActivationErrorKind::MissingAccessToken,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn new_account_is_registered_through_prompter() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"access": "A", "refresh": "R"}))
            .respond_json(401, json!({"detail": "User not found"}))
            .respond_json(200, json!({"first_name": "Dana"}))
            .respond_json(200, json!({"uuid": "u-new"}));
        let prompter = Arc::new(NewUser::default());
        let mut manager = SessionManager::new(phone(), store_in(&dir), Some(prompter.clone()));
        let mut session = Session::for_phone_number(phone());

        manager
            .activate(&transport.dispatcher(), &mut session, code())
            .await
            .unwrap();

        assert_eq!(*prompter.asked.lock().unwrap(), 1);
        assert_eq!(session.account_id().unwrap().as_str(), "u-new");
        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[2].method, Method::Patch);
        assert_eq!(requests[2].path(), "/main/users/profile/");
        assert_eq!(
            requests[2].body,
            Some(json!({
                "email": "dana@example.com",
                "first_name": "Dana",
                "last_name": "Levi",
                "login_type": "email",
            }))
        );
    }

    #[tokio::test]
    async fn new_account_without_prompter_keeps_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"access": "A", "refresh": "R"}))
            .respond_json(401, json!({"detail": "User not found"}));
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());

        let err = manager
            .activate(&transport.dispatcher(), &mut session, code())
            .await
            .unwrap_err();
        match err {
            MeError::Api(api) => assert!(api.is(401, "User not found")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            read_file(manager.store()),
            json!({"9725551234": {"access": "A", "refresh": "R"}})
        );
    }

    #[tokio::test]
    async fn refresh_keeps_stored_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"9725551234": {"access": "OLD", "refresh": "R", "uuid": "u-1"}}"#,
        )
        .unwrap();
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({"access": "NEW", "expires_in": 60}));
        let mut manager = SessionManager::new(phone(), store, None);
        let mut session = Session::for_phone_number(phone());
        manager.bootstrap(&mut session).unwrap();

        manager
            .refresh(&transport.dispatcher(), &mut session)
            .await
            .unwrap();

        assert_eq!(session.access_token().unwrap().as_str(), "NEW");
        assert_eq!(
            read_file(manager.store()),
            json!({"9725551234": {
                "access": "NEW",
                "expires_in": 60,
                "refresh": "R",
                "uuid": "u-1",
            }})
        );
        let requests = transport.requests();
        assert_eq!(requests[0].path(), "/auth/authorization/login/");
        assert_eq!(
            requests[0].body,
            Some(json!({"phone_number": "9725551234", "pwd_token": "R"}))
        );
    }

    #[tokio::test]
    async fn refresh_prefers_password_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"9725551234": {"access": "A", "refresh": "R", "pwd_token": "P"}}"#,
        )
        .unwrap();
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({"access": "NEW"}));
        let mut manager = SessionManager::new(phone(), store, None);
        let mut session = Session::for_phone_number(phone());

        manager
            .refresh(&transport.dispatcher(), &mut session)
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].body.as_ref().unwrap()["pwd_token"], "P");
    }

    #[tokio::test]
    async fn broken_refresh_token_requires_new_activation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            r#"{"9725551234": {"access": "A", "refresh": "R"}}"#,
        )
        .unwrap();
        let transport = FakeTransport::new();
        transport
            .respond_json(400, json!({"detail": "api_incorrect_pwd_token"}))
            .respond_json(200, json!({"access": "A2", "refresh": "R2"}))
            .respond_json(200, json!({"uuid": "u-1"}));
        let mut manager = SessionManager::new(phone(), store, None);
        let mut session = Session::for_phone_number(phone());
        manager.bootstrap(&mut session).unwrap();
        let dispatcher = transport.dispatcher();

        let err = manager.refresh(&dispatcher, &mut session).await.unwrap_err();
        assert!(matches!(
            err,
            MeError::Refresh {
                kind: RefreshErrorKind::BrokenRefreshToken,
                ..
            }
        ));
        assert_eq!(manager.state(), SessionState::PendingActivation);
        assert_eq!(session.access_token(), None);

        manager.activate(&dispatcher, &mut session, code()).await.unwrap();
        assert_eq!(manager.state(), SessionState::Authenticated);
        assert_eq!(session.access_token().unwrap().as_str(), "A2");
    }

    #[tokio::test]
    async fn refresh_without_stored_credential_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let mut manager = SessionManager::new(phone(), store_in(&dir), None);
        let mut session = Session::for_phone_number(phone());

        let err = manager
            .refresh(&transport.dispatcher(), &mut session)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeError::Refresh {
                kind: RefreshErrorKind::MissingCredential,
                source: None
            }
        ));
        assert_eq!(manager.state(), SessionState::PendingActivation);
        assert!(transport.requests().is_empty());
    }
}
