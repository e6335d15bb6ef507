use serde_json::{Value, json};

use crate::domain::NotificationQuery;

const NOTIFICATION_ITEMS_PATH: &str = "/notification/notification/items/";

/// Feed path with the query string the backend expects.
///
/// Categories are sent as a bracketed, comma-separated list, pre-encoded as
/// `%5BA%2C%20B%5D`.
pub fn encode_notifications_path(query: &NotificationQuery) -> String {
    let mut path = format!(
        "{NOTIFICATION_ITEMS_PATH}?page={}&page_size={}&status=distributed",
        query.page, query.page_size
    );
    let codes = query
        .categories
        .iter()
        .flat_map(|category| category.codes().iter().copied())
        .collect::<Vec<_>>();
    if !codes.is_empty() {
        path.push_str("&categories=%5B");
        path.push_str(&codes.join("%2C%20"));
        path.push_str("%5D");
    }
    path
}

pub fn encode_read_notification(notification_id: u64) -> Value {
    json!({"notification_id": notification_id})
}
