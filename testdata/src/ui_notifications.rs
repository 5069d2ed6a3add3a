use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{INSTALLER_ID, SECOND_USER_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationStatus {
    New,
    Read,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: NotificationStatus,
    pub redirect_to: String,
}

/// Five notifications for the first user in every status, one for the second.
pub fn notifications() -> Vec<Notification> {
    [
        (INSTALLER_ID, NotificationStatus::New),
        (INSTALLER_ID, NotificationStatus::New),
        (INSTALLER_ID, NotificationStatus::New),
        (INSTALLER_ID, NotificationStatus::Read),
        (INSTALLER_ID, NotificationStatus::Archived),
        (SECOND_USER_ID, NotificationStatus::New),
    ]
    .into_iter()
    .zip(1..)
    .map(|((user_id, status), id)| Notification {
        id,
        user_id,
        title: format!("notification {id}"),
        content: format!("notification content {id}"),
        status,
        redirect_to: "https://www.google.com/".to_string(),
    })
    .collect()
}
