use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROOM_PREFIX: &str = "room::";

pub fn room_doc_id(room_id: &str) -> String {
    format!("{ROOM_PREFIX}{room_id}")
}

/// CouchDB envelope around one room tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchRoomDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub room: Value,
}

impl CouchRoomDocument {
    pub fn new(room_id: &str, room: Value, rev: Option<String>) -> Self {
        Self {
            id: room_doc_id(room_id),
            rev,
            doc_type: "room".to_owned(),
            room,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_documents_omit_revision() {
        let doc = CouchRoomDocument::new("ab12c", json!({ "roomId": "ab12c" }), None);
        let encoded = serde_json::to_value(&doc).unwrap();
        assert_eq!(encoded["_id"], "room::ab12c");
        assert!(encoded.get("_rev").is_none());
    }
}
