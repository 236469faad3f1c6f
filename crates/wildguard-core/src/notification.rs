use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of notifications held by the store.
pub const NOTIFICATION_CAP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

/// An entry in the header notification log. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: String,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

/// Prepend `notification` and drop whatever falls past the cap.
pub(crate) fn push_capped(list: &mut Vec<Notification>, notification: Notification) {
    list.insert(0, notification);
    list.truncate(NOTIFICATION_CAP);
}
