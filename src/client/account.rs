//! Own profile, address book, call log, blocking and location.

use serde_json::Value;

use crate::client::error::MeError;
use crate::client::http::Method;
use crate::client::{MeClient, required};
use crate::domain::{
    AccountId, CallLogEntry, Contact, Coordinates, PhoneNumber, ProfileUpdate, UpdateOutcome,
};
use crate::transport;

const SEARCH_PATH: &str = "/main/contacts/search/";
const NOT_FOUND: &str = "Not found.";

impl MeClient {
    /// Look up a phone number. Returns `None` when the backend knows nothing about it.
    ///
    /// Errors:
    /// - [`MeError::Api`] for any failure other than the backend's 404 `Not found.`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn phone_search(
        &mut self,
        phone_number: PhoneNumber,
    ) -> Result<Option<Value>, MeError> {
        let path = format!("{SEARCH_PATH}?{}={phone_number}", PhoneNumber::FIELD);
        match self.get(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(MeError::Api(api)) if api.is(404, NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Full profile of `account_id`, or of the caller when `None`.
    pub async fn get_profile_info(
        &mut self,
        account_id: Option<&AccountId>,
    ) -> Result<Value, MeError> {
        match account_id {
            Some(id) => self.get(&format!("{}{id}", transport::PROFILE_PATH)).await,
            None => self.get(transport::PROFILE_ME_PATH).await,
        }
    }

    /// Account id behind `phone_number`, or the caller's own when `None`.
    pub async fn get_uuid(
        &mut self,
        phone_number: Option<PhoneNumber>,
    ) -> Result<Option<AccountId>, MeError> {
        let Some(phone_number) = phone_number else {
            return self.own_account_id().await.map(Some);
        };
        let found = self.phone_search(phone_number).await?;
        Ok(found
            .as_ref()
            .and_then(|body| body.get("contact"))
            .and_then(|contact| contact.get(AccountId::FIELD))
            .and_then(Value::as_str)
            .and_then(|uuid| AccountId::new(uuid).ok()))
    }

    /// The caller's account id, fetched once and then kept in the session.
    pub(crate) async fn own_account_id(&mut self) -> Result<AccountId, MeError> {
        if let Some(id) = self.session.account_id() {
            return Ok(id.clone());
        }
        let body = self.get(transport::PROFILE_ME_PATH).await?;
        let id = transport::decode_account_id(&body).ok_or(MeError::UnexpectedResponse {
            field: AccountId::FIELD,
        })?;
        self.session.account_id = Some(id.clone());
        Ok(id)
    }

    /// Change profile fields. The backend echoes the stored profile; fields whose echo
    /// differs are reported as failed. `profile_picture` is never compared since the
    /// backend rehosts the image.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] when `update` sets no field, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn update_profile_info(
        &mut self,
        update: &ProfileUpdate,
    ) -> Result<UpdateOutcome, MeError> {
        let sent = transport::encode_profile_update(update)?;
        let echoed = self
            .dispatch(
                Method::Patch,
                transport::PROFILE_PATH,
                Some(&Value::Object(sent.clone())),
                true,
            )
            .await?;
        Ok(UpdateOutcome {
            failed: transport::diff_echoed(&sent, &echoed, &["profile_picture"]),
        })
    }

    /// Delete the account. On success the stored credential is dropped as well.
    pub async fn delete_account(&mut self) -> Result<bool, MeError> {
        let body = self
            .dispatch(Method::Delete, "/main/settings/remove-user/", None, true)
            .await?;
        let deleted = is_empty_body(&body);
        if let Some(manager) = self.manager.as_ref().filter(|_| deleted) {
            manager.store().remove(manager.phone_number())?;
        }
        Ok(deleted)
    }

    /// Hide the account from other users without deleting it.
    ///
    /// Errors:
    /// - [`MeError::UnexpectedResponse`] when the answer lacks `contact_suspended`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn suspend_account(&mut self) -> Result<bool, MeError> {
        let body = self
            .dispatch(Method::Put, "/main/settings/suspend-user/", None, true)
            .await?;
        required(&body, "contact_suspended", transport::bool_field)
    }

    /// Upload contacts to the caller's address book.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] for an empty list, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn add_contacts(&mut self, contacts: &[Contact]) -> Result<Value, MeError> {
        let body = transport::encode_contacts_sync(contacts, false)?;
        self.post("/main/contacts/sync/", &body).await
    }

    /// Remove contacts from the caller's address book. Fails like [`MeClient::add_contacts`].
    pub async fn remove_contacts(&mut self, contacts: &[Contact]) -> Result<Value, MeError> {
        let body = transport::encode_contacts_sync(contacts, true)?;
        self.post("/main/contacts/sync/", &body).await
    }

    /// Upload call-log entries.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] for an empty list, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn add_calls_to_log(&mut self, calls: &[CallLogEntry]) -> Result<Value, MeError> {
        let body = transport::encode_call_log_sync(calls, false)?;
        self.post("/main/call-log/change-sync/", &body).await
    }

    /// Remove call-log entries. Fails like [`MeClient::add_calls_to_log`].
    pub async fn remove_calls_from_log(
        &mut self,
        calls: &[CallLogEntry],
    ) -> Result<Value, MeError> {
        let body = transport::encode_call_log_sync(calls, true)?;
        self.post("/main/call-log/change-sync/", &body).await
    }

    /// Block a profile for calls (`block_contact`) and/or social features (`me_full_block`).
    pub async fn block_profile(
        &mut self,
        phone_number: PhoneNumber,
        block_contact: bool,
        me_full_block: bool,
    ) -> Result<bool, MeError> {
        let body = transport::encode_block_profile(phone_number, block_contact, me_full_block);
        let result = self.post("/main/users/profile/block/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Lift every block set with [`MeClient::block_profile`].
    pub async fn unblock_profile(&mut self, phone_number: PhoneNumber) -> Result<bool, MeError> {
        let body = transport::encode_block_profile(phone_number, false, false);
        let result = self.post("/main/users/profile/block/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Block several numbers at once, without profile-level blocking.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] for an empty list, before any request,
    /// - [`MeError::UnexpectedResponse`] when the answer lacks `block_contact`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn block_numbers(&mut self, numbers: &[PhoneNumber]) -> Result<bool, MeError> {
        let body = transport::encode_block_numbers(numbers)?;
        let result = self.post("/main/users/profile/bulk-block/", &body).await?;
        required(&result, "block_contact", transport::bool_field)
    }

    /// Undo [`MeClient::block_numbers`].
    pub async fn unblock_numbers(&mut self, numbers: &[PhoneNumber]) -> Result<bool, MeError> {
        let body = transport::encode_block_numbers(numbers)?;
        let result = self.post("/main/users/profile/bulk-unblock/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Numbers the caller has blocked.
    pub async fn get_blocked_numbers(&mut self) -> Result<Value, MeError> {
        self.get("/main/settings/blocked-phone-numbers/").await
    }

    /// Publish the caller's coordinates to contacts who share theirs.
    pub async fn update_location(&mut self, coordinates: Coordinates) -> Result<bool, MeError> {
        let body = transport::encode_location(coordinates);
        let result = self.post("/main/location/update/", &body).await?;
        required(&result, "success", transport::bool_field)
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(value) => !value,
        Value::String(value) => value.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::http::fake::FakeTransport;
    use crate::client::test_support::{phone_client, token_client};
    use crate::domain::{CallType, FacebookId, ProfilePictureUrl, ValidationError};

    fn number() -> PhoneNumber {
        PhoneNumber::normalize("972551234567").unwrap()
    }

    #[tokio::test]
    async fn phone_search_returns_none_when_not_found() {
        let transport = FakeTransport::new();
        transport.respond_json(404, json!({"detail": "Not found."}));
        let mut client = token_client(&transport);

        assert_eq!(client.phone_search(number()).await.unwrap(), None);
        assert_eq!(
            transport.requests()[0].path(),
            "/main/contacts/search/?phone_number=972551234567"
        );
    }

    #[tokio::test]
    async fn phone_search_keeps_other_404s_as_errors() {
        let transport = FakeTransport::new();
        transport.respond_json(404, json!({"detail": "Gone"}));
        let mut client = token_client(&transport);

        assert!(matches!(
            client.phone_search(number()).await,
            Err(MeError::Api(_))
        ));
    }

    #[tokio::test]
    async fn get_uuid_reads_contact_from_search() {
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"contact": {"uuid": "u-9", "name": "Dana"}}))
            .respond_json(404, json!({"detail": "Not found."}));
        let mut client = token_client(&transport);

        let id = client.get_uuid(Some(number())).await.unwrap();
        assert_eq!(id.unwrap().as_str(), "u-9");
        assert_eq!(client.get_uuid(Some(number())).await.unwrap(), None);
    }

    #[tokio::test]
    async fn own_uuid_comes_from_session_first() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let mut client = phone_client(&dir, &transport);

        let id = client.get_uuid(None).await.unwrap();
        assert_eq!(id.unwrap().as_str(), "u-1");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn get_profile_info_picks_path() {
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({})).respond_json(200, json!({}));
        let mut client = token_client(&transport);

        client.get_profile_info(None).await.unwrap();
        let other = AccountId::new("u-2").unwrap();
        client.get_profile_info(Some(&other)).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path(), "/main/users/profile/me/");
        assert_eq!(requests[1].path(), "/main/users/profile/u-2");
    }

    #[tokio::test]
    async fn update_profile_reports_mismatched_echoes() {
        let transport = FakeTransport::new();
        transport.respond_json(
            200,
            json!({
                "first_name": "Dana",
                "facebook_url": "999",
                "profile_picture": "https://cdn.me.app/rehosted.jpg",
            }),
        );
        let mut client = token_client(&transport);
        let update = ProfileUpdate {
            first_name: Some("Dana".to_owned()),
            facebook_id: Some(FacebookId::new("123").unwrap()),
            profile_picture: Some(ProfilePictureUrl::new("https://x.com/me.jpg").unwrap()),
            ..Default::default()
        };

        let outcome = client.update_profile_info(&update).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.failed, vec!["facebook_url".to_owned()]);
        assert_eq!(transport.requests()[0].method, Method::Patch);
    }

    #[tokio::test]
    async fn empty_profile_update_sends_nothing() {
        let transport = FakeTransport::new();
        let mut client = token_client(&transport);

        let err = client
            .update_profile_info(&ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MeError::Validation(ValidationError::NothingToUpdate { .. })
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn delete_account_drops_stored_credential() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        transport.respond(204, "");
        let mut client = phone_client(&dir, &transport);

        assert!(client.delete_account().await.unwrap());
        let stored = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&stored).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn typed_results_require_their_field() {
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"contact_suspended": true}))
            .respond_json(200, json!({}));
        let mut client = token_client(&transport);

        assert!(client.suspend_account().await.unwrap());
        let err = client.suspend_account().await.unwrap_err();
        assert!(matches!(
            err,
            MeError::UnexpectedResponse {
                field: "contact_suspended"
            }
        ));
    }

    #[tokio::test]
    async fn blocking_endpoints() {
        let transport = FakeTransport::new();
        transport
            .respond_json(200, json!({"success": true}))
            .respond_json(200, json!({"success": true}))
            .respond_json(200, json!({"block_contact": true}))
            .respond_json(200, json!({"success": true}));
        let mut client = token_client(&transport);

        assert!(client.block_profile(number(), true, true).await.unwrap());
        assert!(client.unblock_profile(number()).await.unwrap());
        assert!(client.block_numbers(&[number()]).await.unwrap());
        assert!(client.unblock_numbers(&[number()]).await.unwrap());

        let requests = transport.requests();
        assert_eq!(requests[1].body.as_ref().unwrap()["block_contact"], false);
        assert_eq!(requests[2].path(), "/main/users/profile/bulk-block/");
        assert_eq!(requests[3].path(), "/main/users/profile/bulk-unblock/");
    }

    #[tokio::test]
    async fn sync_endpoints_post_to_their_paths() {
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({})).respond_json(200, json!({}));
        let mut client = token_client(&transport);

        client
            .add_contacts(&[Contact::new("Dana", number()).unwrap()])
            .await
            .unwrap();
        client
            .remove_calls_from_log(&[CallLogEntry::new(
                number(),
                CallType::Incoming,
                "2022-04-18T05:59:07Z",
            )])
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path(), "/main/contacts/sync/");
        assert_eq!(requests[1].path(), "/main/call-log/change-sync/");
        assert_eq!(requests[1].body.as_ref().unwrap()["add"], json!([]));
    }

    #[tokio::test]
    async fn update_location_posts_coordinates() {
        let transport = FakeTransport::new();
        transport.respond_json(200, json!({"success": true}));
        let mut client = token_client(&transport);

        let ok = client
            .update_location(Coordinates::new(31.5, 35.0).unwrap())
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(
            transport.requests()[0].body,
            Some(json!({"location_latitude": 31.5, "location_longitude": 35.0}))
        );
    }
}
