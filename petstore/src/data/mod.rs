pub mod order;
pub mod pet;
pub mod user;

pub use order::Order;
pub use pet::{Category, Pet, Tag};
pub use user::User;

/// The service accepts and sometimes echoes identifiers as strings; either form reads as `i64`.
pub(crate) mod lenient_id {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Number(id) => Ok(id),
            RawId::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }
}
