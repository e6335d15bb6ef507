use serde_json::Value;

use crate::client::error::MeError;
use crate::client::{MeClient, required};
use crate::domain::{NotificationQuery, NotificationSettingsUpdate, UpdateOutcome};
use crate::transport;

impl MeClient {
    /// Number of unread notifications.
    ///
    /// Errors:
    /// - [`MeError::UnexpectedResponse`] when the answer lacks `count`,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn unread_notifications_count(&mut self) -> Result<u64, MeError> {
        let body = self.get("/notification/notification/count/").await?;
        required(&body, "count", transport::u64_field)
    }

    /// One page of the notification feed, optionally filtered by category.
    pub async fn get_notifications(&mut self, query: &NotificationQuery) -> Result<Value, MeError> {
        self.get(&transport::encode_notifications_path(query)).await
    }

    /// Mark a notification as read. Returns the backend's `is_read` flag.
    pub async fn read_notification(&mut self, notification_id: u64) -> Result<bool, MeError> {
        let body = transport::encode_read_notification(notification_id);
        let result = self
            .post("/notification/notification/read/", &body)
            .await?;
        required(&result, "is_read", transport::bool_field)
    }

    /// Toggle notification kinds. Settings the backend did not echo back are reported
    /// as failed.
    ///
    /// Errors:
    /// - Returns [`MeError::Validation`] when `update` sets no field, before any request,
    /// - the dispatch errors of [`MeClient::dispatch`].
    pub async fn change_notification_settings(
        &mut self,
        update: &NotificationSettingsUpdate,
    ) -> Result<UpdateOutcome, MeError> {
        let sent = transport::encode_notification_settings(update)?;
        self.patch_settings(sent).await
    }
}
