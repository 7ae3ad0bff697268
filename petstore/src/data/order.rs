use super::lenient_id;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub pet_id: i64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_date: Option<String>,
    pub status: String,
    pub complete: bool,
}
