//! Installer clients and the comments left on them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::INSTALLER_ID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub client_id: i64,
    pub message: String,
}

pub fn clients() -> Vec<Client> {
    vec![
        Client {
            id: 1,
            user_id: 1,
            installer_id: Some(INSTALLER_ID),
        },
        Client {
            id: 2,
            user_id: 2,
            installer_id: None,
        },
    ]
}

/// Two comments per client.
pub fn comments() -> Vec<Comment> {
    (1..=4)
        .map(|id| Comment {
            id,
            client_id: (id + 1) / 2,
            message: format!("message {id}"),
        })
        .collect()
}
