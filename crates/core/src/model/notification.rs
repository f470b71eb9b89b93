use super::empty_as_none;
use serde::{Deserialize, Serialize};

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Urgent,
    Unread,
    #[default]
    #[serde(other)]
    Info,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Urgent,
    High,
    #[default]
    #[serde(other)]
    Normal,
}

/// A pharmacy update or alert addressed to the signed-in physician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    /// Relative time label supplied by the backend, e.g. `5 minutes ago`.
    #[serde(rename = "time", default)]
    pub time_label: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub action_required: bool,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub related_order_id: Option<String>,
}

/// Number of unread notifications.
///
/// This is the only source of the badge value; badges never keep a count of
/// their own.
pub fn compute_unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
