//! Roles and users of the user service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{INSTALLER_ID, SECOND_USER_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub address_addition: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    /// JSON document stored as text.
    pub extra_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: Address,
    pub role: String,
}

pub fn roles() -> Vec<Role> {
    vec![Role {
        id: 1,
        name: "installer".to_string(),
        description: "installer".to_string(),
    }]
}

fn address() -> Address {
    Address {
        name: "name".to_string(),
        address_addition: "address_addition".to_string(),
        zip_code: "12345".to_string(),
        city: "Lyon".to_string(),
        country: "France".to_string(),
        lat: 0.21,
        lng: 0.23,
        extra_data: r#"{"dummy": "data"}"#.to_string(),
    }
}

/// Two active, verified installers.
pub fn users() -> Vec<User> {
    [
        (INSTALLER_ID, "email@test.fr", "hashed_password", "user1", "0786237863"),
        (SECOND_USER_ID, "email2@test.fr", "hashed_password2", "user2", "0786287697"),
    ]
    .into_iter()
    .map(|(id, email, hashed_password, name, phone)| User {
        id,
        email: email.to_string(),
        hashed_password: hashed_password.to_string(),
        is_active: true,
        is_superuser: false,
        is_verified: true,
        first_name: name.to_string(),
        last_name: name.to_string(),
        phone: phone.to_string(),
        address: address(),
        role: "installer".to_string(),
    })
    .collect()
}
