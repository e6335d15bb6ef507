//! Friendship, spam reports, comments, names and linked social networks.

use chrono::Local;
use serde_json::{Value, json};

use crate::client::error::MeError;
use crate::client::http::Method;
use crate::client::{MeClient, required};
use crate::domain::{
    AccountId, CountryCode, PhoneNumber, SocialLink, SocialNetwork, SocialOutcome,
    ValidationError,
};
use crate::transport;

const COMMENTS_PATH: &str = "/main/comments/";
const SUGGEST_TURN_ON_PATH: &str = "/main/users/profile/suggest-turn-on-";

fn non_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

impl MeClient {
    /// Mutual-contact details between the caller and `phone_number`.
    pub async fn friendship(&mut self, phone_number: PhoneNumber) -> Result<Value, MeError> {
        let path = format!(
            "/main/contacts/friendship/?{}={phone_number}",
            PhoneNumber::FIELD
        );
        self.get(&path).await
    }

    /// Report `phone_number` as spam under the name `spam_name`.
    pub async fn report_spam(
        &mut self,
        country_code: &CountryCode,
        spam_name: &str,
        phone_number: PhoneNumber,
    ) -> Result<bool, MeError> {
        non_blank(spam_name, "name")?;
        let body = transport::encode_report_spam(country_code, spam_name, phone_number);
        let result = self.post("/main/names/suggestion/report/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Number of spam reports against `phone_number`; 0 when unknown.
    pub async fn is_spammer(&mut self, phone_number: PhoneNumber) -> Result<u64, MeError> {
        let found = self.phone_search(phone_number).await?;
        Ok(found
            .as_ref()
            .and_then(|body| body.get("contact"))
            .and_then(|contact| transport::u64_field(contact, "suggested_as_spam"))
            .unwrap_or(0))
    }

    /// Age in years of `account_id` (the caller when `None`), from the profile's birth date.
    ///
    /// Returns `0.0` when the profile has no usable `date_of_birth`.
    ///
    /// Errors:
    /// - anything [`MeClient::get_profile_info`] returns.
    pub async fn get_age(&mut self, account_id: Option<&AccountId>) -> Result<f64, MeError> {
        let profile = self.get_profile_info(account_id).await?;
        Ok(transport::decode_age(&profile, Local::now().date_naive()))
    }

    /// Users who removed the caller from their contacts. Needs `who_deleted_enabled`.
    pub async fn who_deleted(&mut self) -> Result<Value, MeError> {
        self.get("/main/users/profile/who-deleted/").await
    }

    /// Users who viewed the caller's profile. Needs `who_watched_enabled`.
    pub async fn who_watched(&mut self) -> Result<Value, MeError> {
        self.get("/main/users/profile/who-watched/").await
    }

    /// Comments on `account_id`'s profile, or on the caller's own when `None`.
    pub async fn get_comments(&mut self, account_id: Option<&AccountId>) -> Result<Value, MeError> {
        let account_id = match account_id {
            Some(id) => id.clone(),
            None => self.own_account_id().await?,
        };
        self.get(&format!("{COMMENTS_PATH}list/{account_id}")).await
    }

    /// One comment by id.
    pub async fn get_comment(&mut self, comment_id: u64) -> Result<Value, MeError> {
        self.get(&format!("{COMMENTS_PATH}retrieve/{comment_id}")).await
    }

    /// Publish a pending comment on the caller's profile.
    pub async fn approve_comment(&mut self, comment_id: u64) -> Result<bool, MeError> {
        let path = format!("{COMMENTS_PATH}approve/{comment_id}");
        let result = self.dispatch(Method::Post, &path, None, true).await?;
        Ok(comment_status(&result)? == "approved")
    }

    /// Reject a comment on the caller's profile, pending or already published.
    ///
    /// Errors:
    /// - [`MeError::UnexpectedResponse`] when the answer has no `status`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn delete_comment(&mut self, comment_id: u64) -> Result<bool, MeError> {
        let path = format!("{COMMENTS_PATH}approve/{comment_id}");
        let result = self.dispatch(Method::Delete, &path, None, true).await?;
        Ok(comment_status(&result)? == "ignored")
    }

    /// Like a comment. Returns the backend's `success` flag.
    pub async fn like_comment(&mut self, comment_id: u64) -> Result<bool, MeError> {
        let path = format!("{COMMENTS_PATH}like/{comment_id}");
        let result = self.dispatch(Method::Post, &path, None, true).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Leave a comment on `account_id`'s profile. It waits for the owner's approval.
    ///
    /// Returns the new comment id, or `None` when the backend did not queue it.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] for a blank message, before any request,
    /// - [`MeError::UnexpectedResponse`] when a queued comment comes back without an `id`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn publish_comment(
        &mut self,
        account_id: &AccountId,
        message: &str,
    ) -> Result<Option<u64>, MeError> {
        non_blank(message, "message")?;
        let path = format!("{COMMENTS_PATH}add/{account_id}");
        let body = json!({"message": message});
        // The backend takes this one as a GET with a JSON body.
        let result = self.dispatch(Method::Get, &path, Some(&body), true).await?;
        if result.get("status").and_then(Value::as_str) != Some("waiting") {
            return Ok(None);
        }
        required(&result, "id", transport::u64_field).map(Some)
    }

    /// Names the caller is saved under in other people's address books.
    pub async fn get_groups_names(&mut self) -> Result<Value, MeError> {
        self.get("/main/names/groups/").await
    }

    /// Names hidden with [`MeClient::delete_name`].
    pub async fn get_deleted_names(&mut self) -> Result<Value, MeError> {
        self.get("/main/settings/hidden-names/").await
    }

    /// Hide the names saved under the given contact ids.
    pub async fn delete_name(&mut self, contact_ids: &[u64]) -> Result<bool, MeError> {
        let body = transport::encode_contact_ids(contact_ids)?;
        let result = self.post("/main/contacts/hide/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Undo [`MeClient::delete_name`].
    pub async fn restore_name(&mut self, contact_ids: &[u64]) -> Result<bool, MeError> {
        let body = transport::encode_contact_ids(contact_ids)?;
        let result = self.post("/main/settings/hidden-names/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Ask the owners of `contact_ids` to rename the caller to `new_name`.
    pub async fn ask_group_rename(
        &mut self,
        contact_ids: &[u64],
        new_name: &str,
    ) -> Result<bool, MeError> {
        non_blank(new_name, "name")?;
        let mut body = transport::encode_contact_ids(contact_ids)?;
        body["name"] = Value::from(new_name);
        let result = self.post("/main/names/suggestion/", &body).await?;
        required(&result, "success", transport::bool_field)
    }

    /// Linked social networks of `account_id`, or of the caller when `None`.
    pub async fn get_socials(&mut self, account_id: Option<&AccountId>) -> Result<Value, MeError> {
        let Some(account_id) = account_id else {
            return self
                .dispatch(Method::Post, "/main/social/update/", None, true)
                .await;
        };
        let mut profile = self.get_profile_info(Some(account_id)).await?;
        profile
            .get_mut("social")
            .map(Value::take)
            .ok_or(MeError::UnexpectedResponse { field: "social" })
    }

    /// Link social networks to the caller's profile. Each link is sent on its own; the
    /// outcome lists the networks the backend did not confirm.
    pub async fn add_social(&mut self, links: &[SocialLink]) -> Result<SocialOutcome, MeError> {
        if links.is_empty() {
            return Err(ValidationError::Empty { field: "socials" }.into());
        }
        let mut outcome = SocialOutcome::default();
        for link in links {
            let (path, body) = transport::encode_social_link(link);
            let result = self.post(path, &body).await?;
            let confirmed = match link {
                SocialLink::AuthCode { .. } => transport::bool_field(&result, "success"),
                SocialLink::ProfileUrl { network, url } => Some(
                    result
                        .get(network.as_str())
                        .and_then(|entry| entry.get("profile_id"))
                        .and_then(Value::as_str)
                        == Some(url.as_str()),
                ),
            };
            if confirmed != Some(true) {
                outcome.failed.push(link.network().as_str());
            }
        }
        Ok(outcome)
    }

    /// Unlink social networks one by one. Networks the backend refused end up in
    /// [`SocialOutcome::failed`].
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] for an empty list, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`], which stop the loop.
    pub async fn remove_social(
        &mut self,
        networks: &[SocialNetwork],
    ) -> Result<SocialOutcome, MeError> {
        if networks.is_empty() {
            return Err(ValidationError::Empty { field: "socials" }.into());
        }
        let mut outcome = SocialOutcome::default();
        for network in networks {
            let body = transport::encode_social_name(*network);
            let result = self.post("/main/social/delete/", &body).await?;
            if transport::bool_field(&result, "success") != Some(true) {
                outcome.failed.push(network.as_str());
            }
        }
        Ok(outcome)
    }

    /// Show (`true`) or hide (`false`) linked networks on the caller's profile.
    ///
    /// Networks already in the requested state need no request. Networks that are not
    /// linked are reported as failed.
    pub async fn switch_social_status(
        &mut self,
        changes: &[(SocialNetwork, bool)],
    ) -> Result<SocialOutcome, MeError> {
        if changes.is_empty() {
            return Err(ValidationError::Empty { field: "socials" }.into());
        }
        let mut outcome = SocialOutcome::default();
        for &(network, visible) in changes {
            let socials = self.get_socials(None).await?;
            let entry = socials.get(network.as_str());
            let is_active = entry
                .and_then(|e| transport::bool_field(e, "is_active"))
                .unwrap_or(false);
            let is_hidden = entry.and_then(|e| transport::bool_field(e, "is_hidden"));
            let switched = match (is_active, is_hidden) {
                (false, _) | (true, None) => false,
                (true, Some(hidden)) if hidden != visible => true,
                (true, Some(_)) => {
                    let body = transport::encode_social_name(network);
                    let result = self.post("/main/social/hide/", &body).await?;
                    transport::bool_field(&result, "is_hidden") == Some(!visible)
                }
            };
            if !switched {
                outcome.failed.push(network.as_str());
            }
        }
        Ok(outcome)
    }

    /// Size of the caller's synced address book.
    pub async fn numbers_count(&mut self) -> Result<u64, MeError> {
        let body = self.get("/main/contacts/count/").await?;
        required(&body, "count", transport::u64_field)
    }

    /// Ask `account_id` to enable comments on their profile.
    pub async fn suggest_turn_on_comments(
        &mut self,
        account_id: &AccountId,
    ) -> Result<bool, MeError> {
        self.suggest_turn_on("comments", account_id).await
    }

    /// Ask `account_id` to share mutual contacts.
    pub async fn suggest_turn_on_mutual(
        &mut self,
        account_id: &AccountId,
    ) -> Result<bool, MeError> {
        self.suggest_turn_on("mutual", account_id).await
    }

    /// Ask `account_id` to share their location.
    pub async fn suggest_turn_on_location(
        &mut self,
        account_id: &AccountId,
    ) -> Result<bool, MeError> {
        self.suggest_turn_on("location", account_id).await
    }

    async fn suggest_turn_on(
        &mut self,
        feature: &str,
        account_id: &AccountId,
    ) -> Result<bool, MeError> {
        let body = json!({(AccountId::FIELD): account_id.as_str()});
        let result = self
            .post(&format!("{SUGGEST_TURN_ON_PATH}{feature}/"), &body)
            .await?;
        required(&result, "requested", transport::bool_field)
    }
}

fn comment_status(body: &Value) -> Result<&str, MeError> {
    body.get("status")
        .and_then(Value::as_str)
        .ok_or(MeError::UnexpectedResponse { field: "status" })
}
