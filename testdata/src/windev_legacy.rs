//! Rows of the legacy customer database.
//!
//! Timestamps are relative to the moment the data set is built, so a meter
//! created "two days ago" stays two days old whenever the tests run.

use chrono::{Duration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id_address: i64,
    pub street: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<String>,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub id_formula: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub id_address: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub user_type: i64,
    pub created_at: NaiveDateTime,
    pub customer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub id: i64,
    pub guid: String,
    pub name: String,
    pub customer_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentSource {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consent {
    pub id: i64,
    pub id_meter: i64,
    pub id_consent_source: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<NaiveDateTime>,
    /// JSON document stored as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterMetric {
    pub id: i64,
    pub meter_id: i64,
    pub created_at: NaiveDateTime,
}

fn utc_ago(delta: Duration) -> NaiveDateTime {
    (Utc::now() - delta).naive_utc()
}

pub fn formulas() -> Vec<Formula> {
    vec![
        Formula {
            id: 1,
            title: "formula1".to_string(),
        },
        Formula {
            id: 2,
            title: "formula2".to_string(),
        },
    ]
}

pub fn addresses() -> Vec<Address> {
    vec![
        Address {
            id_address: 1,
            street: "Pl. Pierre Renaudel, 69003 Lyon, France".to_string(),
            postal_code: "69001".to_string(),
            additional_data: None,
            city: "Lyon".to_string(),
            country: "France".to_string(),
            latitude: 3.23,
            longitude: 4.98,
        },
        Address {
            id_address: 2,
            street: "Gd Rue de Vaise, 69009 Lyon, France".to_string(),
            postal_code: "69003".to_string(),
            additional_data: Some("mma2".to_string()),
            city: "Lyon".to_string(),
            country: "France".to_string(),
            latitude: 0.23,
            longitude: 0.98,
        },
    ]
}

/// One customer per formula and address.
pub fn customers() -> Vec<Customer> {
    let now = Utc::now().naive_utc();
    (1..=2)
        .map(|id| Customer {
            id,
            id_formula: id,
            created_at: now,
            updated_at: now,
            id_address: id,
        })
        .collect()
}

/// Creation times are local, not UTC.
pub fn users() -> Vec<User> {
    let now = Local::now().naive_local();
    [
        (1, "turing@myem.fr", "Alan", "Turing", "1111111111"),
        (2, "ritchie@myem.fr", "Dennis", "Ritchie", "2222222222"),
    ]
    .into_iter()
    .map(|(id, email, firstname, lastname, phone)| User {
        id,
        email: email.to_string(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        phone: phone.to_string(),
        user_type: 1,
        created_at: now,
        customer_id: id,
    })
    .collect()
}

/// The first customer owns meters 1 and 2, the second owns meter 3.
pub fn meters() -> Vec<Meter> {
    [
        (1, "23144138893314", "Mon Compteur", 1, 2),
        (2, "11111111111113", "Mon Compteur 2", 1, 1),
        (3, "19137481697692", "Mon Compteur", 2, 2),
    ]
    .into_iter()
    .map(|(id, guid, name, customer_id, days)| {
        let at = utc_ago(Duration::days(days));
        Meter {
            id,
            guid: guid.to_string(),
            name: name.to_string(),
            customer_id,
            created_at: at,
            updated_at: at,
        }
    })
    .collect()
}

pub fn consents_sources() -> Vec<ConsentSource> {
    vec![
        ConsentSource {
            id: 1,
            name: "DataConnect".to_string(),
        },
        ConsentSource {
            id: 3,
            name: "Chameleon".to_string(),
        },
    ]
}

/// Consents of meter 1 from both sources, revoked and active, plus one
/// active Chameleon consent on meter 3.
pub fn consents() -> Vec<Consent> {
    let revoked = Some(utc_ago(Duration::days(1)));
    let meta = |guid: &str| Some(format!(r#"{{ "chm_guid":"{guid}" }}"#));
    vec![
        Consent {
            id: 1,
            id_meter: 1,
            id_consent_source: 1,
            revoked_at: revoked,
            meta_data: None,
        },
        Consent {
            id: 2,
            id_meter: 1,
            id_consent_source: 1,
            revoked_at: None,
            meta_data: None,
        },
        Consent {
            id: 3,
            id_meter: 1,
            id_consent_source: 3,
            revoked_at: revoked,
            meta_data: meta("0CA2F4076054D254"),
        },
        Consent {
            id: 4,
            id_meter: 1,
            id_consent_source: 3,
            revoked_at: None,
            meta_data: meta("0CA2F489FF0002A6"),
        },
        Consent {
            id: 5,
            id_meter: 3,
            id_consent_source: 3,
            revoked_at: None,
            meta_data: Some(r#"{ "chm_guid": "0CA2F489FF0872A6" }"#.to_string()),
        },
    ]
}

pub fn meter_metrics() -> Vec<MeterMetric> {
    [
        (1, 1, Duration::minutes(15)),
        (2, 1, Duration::minutes(120)),
        (3, 3, Duration::days(1)),
    ]
    .into_iter()
    .map(|(id, meter_id, age)| MeterMetric {
        id,
        meter_id,
        created_at: utc_ago(age),
    })
    .collect()
}
