use serde::{Deserialize, Serialize};

use crate::equipments::EquipmentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    New,
    Pending,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationRequest {
    pub id: i64,
    pub user_id: i64,
    pub status: RequestStatus,
    pub budget: f64,
    pub equipment_type: EquipmentType,
    pub equipment_brand: String,
    pub equipment_model: String,
    pub comment: String,
}

pub fn installation_requests() -> Vec<InstallationRequest> {
    [
        (1, 16, RequestStatus::New, 10.13, EquipmentType::Solar, 1),
        (2, 16, RequestStatus::Pending, 20.23, EquipmentType::Demotic, 1),
        (3, 20, RequestStatus::New, 10.23, EquipmentType::Inverter, 2),
        (4, 20, RequestStatus::Closed, 5.23, EquipmentType::Solar, 2),
    ]
    .into_iter()
    .map(
        |(id, user_id, status, budget, equipment_type, variant)| InstallationRequest {
            id,
            user_id,
            status,
            budget,
            equipment_type,
            equipment_brand: format!("brand{variant}"),
            equipment_model: format!("model{variant}"),
            comment: format!("comment{variant}"),
        },
    )
    .collect()
}
