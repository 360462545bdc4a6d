use serde::{Deserialize, Serialize};

use crate::types::{record_serde, EntityId, Identified, Timestamp};

/// A data-collection project. Projects are created out-of-band; the
/// dashboard only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

record_serde!(Project);

impl Identified for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_either_id_key() {
        let both: Project =
            serde_json::from_value(json!({"_id": "p1", "id": "p1", "name": "Perception"})).unwrap();
        let bare: Project = serde_json::from_value(json!({"id": "p1", "name": "Perception"})).unwrap();
        assert_eq!(both, bare);
    }
}
