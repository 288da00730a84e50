use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MongoDB envelope around one room tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoomDocument {
    #[serde(rename = "_id")]
    pub id: String,
    /// Bumped on every write; guards compare-and-swap replacements.
    pub revision: i64,
    pub room: Value,
}
