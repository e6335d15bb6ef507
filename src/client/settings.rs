use serde_json::{Map, Value};

use crate::client::MeClient;
use crate::client::error::MeError;
use crate::client::http::Method;
use crate::domain::{SocialSettingsUpdate, UpdateOutcome};
use crate::transport;

impl MeClient {
    /// Current account settings (privacy, notifications, language).
    pub async fn get_settings(&mut self) -> Result<Value, MeError> {
        self.get(transport::SETTINGS_PATH).await
    }

    /// Toggle privacy and social features. Settings the backend did not echo back are
    /// reported as failed.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] when `update` sets no field, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn change_social_settings(
        &mut self,
        update: &SocialSettingsUpdate,
    ) -> Result<UpdateOutcome, MeError> {
        let sent = transport::encode_social_settings(update)?;
        self.patch_settings(sent).await
    }

    /// PATCH the settings endpoint and compare the echoed values with what was sent.
    pub(crate) async fn patch_settings(
        &mut self,
        sent: Map<String, Value>,
    ) -> Result<UpdateOutcome, MeError> {
        let body = Value::Object(sent.clone());
        let echoed = self
            .dispatch(Method::Patch, transport::SETTINGS_PATH, Some(&body), true)
            .await?;
        Ok(UpdateOutcome {
            failed: transport::diff_echoed(&sent, &echoed, &[]),
        })
    }
}
