use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EquipmentType {
    Solar,
    Demotic,
    Inverter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub equipment_type: EquipmentType,
    pub brand: String,
    pub reference: String,
    pub installed_at: NaiveDateTime,
}

pub fn equipments() -> Vec<Equipment> {
    let installed_at = NaiveDate::from_ymd_opt(2022, 1, 18)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    [
        (1, 1, EquipmentType::Solar),
        (2, 1, EquipmentType::Demotic),
        (3, 1, EquipmentType::Solar),
        (4, 2, EquipmentType::Inverter),
    ]
    .into_iter()
    .map(|(id, user_id, equipment_type)| Equipment {
        id,
        user_id,
        equipment_type,
        brand: "brand".to_string(),
        reference: "reference".to_string(),
        installed_at,
    })
    .collect()
}
