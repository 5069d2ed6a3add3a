//! MyEM Testdata
//!
//! Fixture rows shared by the test suites of MyEM services. Each module
//! mirrors the tables of one service; [`integration_tables`] gathers all of
//! them into one JSON document for integration environments.

pub mod equipments;
pub mod installation_requests;
pub mod installer_clients;
pub mod ui_notifications;
pub mod user_management;
pub mod windev_legacy;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use uuid::{uuid, Uuid};

/// Id of the first fixture user, an installer owning client 1.
pub const INSTALLER_ID: Uuid = uuid!("3b4408da-f0d6-446d-9b5c-fbe4735ff5e4");

pub const SECOND_USER_ID: Uuid = uuid!("525e1b0e-6000-4ca3-a7e7-617fdf4a4714");

/// Every fixture table keyed by name, as JSON rows.
///
/// User service users appear under `installers` so they do not clash with
/// the legacy `users` table.
///
/// # Errors
///
/// Returns the serialization error of the first table that fails.
pub fn integration_tables() -> serde_json::Result<BTreeMap<&'static str, Value>> {
    fn rows<T: Serialize>(rows: Vec<T>) -> serde_json::Result<Value> {
        serde_json::to_value(rows)
    }

    Ok(BTreeMap::from([
        ("clients", rows(installer_clients::clients())?),
        ("comments", rows(installer_clients::comments())?),
        ("equipments", rows(equipments::equipments())?),
        ("roles", rows(user_management::roles())?),
        ("installers", rows(user_management::users())?),
        ("addresses", rows(windev_legacy::addresses())?),
        ("customers", rows(windev_legacy::customers())?),
        ("users", rows(windev_legacy::users())?),
        ("meters", rows(windev_legacy::meters())?),
        ("consents_sources", rows(windev_legacy::consents_sources())?),
        ("consents", rows(windev_legacy::consents())?),
        ("meter_metrics", rows(windev_legacy::meter_metrics())?),
        ("notifications", rows(ui_notifications::notifications())?),
        (
            "installation_requests",
            rows(installation_requests::installation_requests())?,
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[test]
    fn clients_and_comments() {
        let clients = installer_clients::clients();
        assert_eq!(
            serde_json::to_value(&clients).unwrap(),
            json!([
                {"id": 1, "user_id": 1, "installer_id": "3b4408da-f0d6-446d-9b5c-fbe4735ff5e4"},
                {"id": 2, "user_id": 2},
            ])
        );

        let comments = installer_clients::comments();
        assert_eq!(comments.len(), 4);
        assert_eq!(comments[1].client_id, 1);
        assert_eq!(comments[2].client_id, 2);
        assert_eq!(comments[3].message, "message 4");
    }

    #[test]
    fn equipments_serialize_type_key() {
        let value = serde_json::to_value(equipments::equipments()).unwrap();
        assert_eq!(value[0]["type"], "SOLAR");
        assert_eq!(value[1]["type"], "DEMOTIC");
        assert_eq!(value[3]["type"], "INVERTER");
        assert_eq!(value[3]["user_id"], 2);
        assert_eq!(value[0]["installed_at"], "2022-01-18T00:00:00");
    }

    #[test]
    fn installation_requests_by_user() {
        let requests = installation_requests::installation_requests();
        let value = serde_json::to_value(&requests).unwrap();
        assert_eq!(value[1]["status"], "PENDING");
        assert_eq!(value[2]["equipment_brand"], "brand2");
        assert_eq!(requests.iter().filter(|r| r.user_id == 16).count(), 2);
        assert!((requests[3].budget - 5.23).abs() < f64::EPSILON);
    }

    #[test]
    fn notifications_per_user() {
        let notifications = ui_notifications::notifications();
        assert_eq!(notifications.len(), 6);
        assert_eq!(
            notifications
                .iter()
                .filter(|n| n.user_id == INSTALLER_ID)
                .count(),
            5
        );
        assert_eq!(notifications[5].user_id, SECOND_USER_ID);
        assert_eq!(notifications[5].title, "notification 6");
        assert_eq!(
            serde_json::to_value(notifications[4].status).unwrap(),
            "ARCHIVED"
        );
    }

    #[test]
    fn users_carry_address() {
        let users = user_management::users();
        let value = serde_json::to_value(&users).unwrap();
        assert_eq!(value[0]["id"], "3b4408da-f0d6-446d-9b5c-fbe4735ff5e4");
        assert_eq!(value[1]["first_name"], "user2");
        assert_eq!(value[0]["address"]["city"], "Lyon");

        let extra: Value = serde_json::from_str(&users[0].address.extra_data).unwrap();
        assert_eq!(extra, json!({"dummy": "data"}));
        assert_eq!(user_management::roles()[0].name, "installer");
    }

    #[test]
    fn legacy_users_serialize_type_key() {
        let value = serde_json::to_value(windev_legacy::users()).unwrap();
        assert_eq!(value[0]["type"], 1);
        assert_eq!(value[1]["lastname"], "Ritchie");
    }

    #[test]
    fn legacy_timestamps_are_relative_to_now() {
        let now = Utc::now().naive_utc();
        let meters = windev_legacy::meters();
        let age = now - meters[0].created_at;
        assert!(age >= Duration::days(2) - Duration::seconds(5));
        assert!(age <= Duration::days(2) + Duration::seconds(5));

        let metrics = windev_legacy::meter_metrics();
        assert!(metrics[0].created_at > metrics[1].created_at);
        assert!(metrics[1].created_at > metrics[2].created_at);
    }

    #[test]
    fn consents_optional_fields_are_omitted() {
        let consents = serde_json::to_value(windev_legacy::consents()).unwrap();
        assert!(consents[1].get("revoked_at").is_none());
        assert!(consents[1].get("meta_data").is_none());
        assert!(consents[0].get("revoked_at").is_some());

        let meta: Value = serde_json::from_str(consents[3]["meta_data"].as_str().unwrap()).unwrap();
        assert_eq!(meta["chm_guid"], "0CA2F489FF0002A6");

        let addresses = serde_json::to_value(windev_legacy::addresses()).unwrap();
        assert!(addresses[0].get("additional_data").is_none());
        assert_eq!(addresses[1]["additional_data"], "mma2");
    }

    #[test]
    fn integration_tables_cover_every_set() {
        let tables = integration_tables().unwrap();
        assert_eq!(tables.len(), 14);
        assert_eq!(tables["installers"][0]["email"], "email@test.fr");
        assert_eq!(tables["users"][0]["email"], "turing@myem.fr");
        assert_eq!(tables["meters"].as_array().unwrap().len(), 3);
        assert_eq!(tables["consents_sources"][1]["id"], 3);
    }
}
