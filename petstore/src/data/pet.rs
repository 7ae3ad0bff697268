use super::lenient_id;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Category {
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: i64,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Pet {
    #[serde(deserialize_with = "lenient_id::deserialize")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub name: String,
    pub photo_urls: Vec<String>,
    pub tags: Vec<Tag>,
    pub status: String,
}
