//! Realtime change events and the collection reducer.
//!
//! The realtime channel delivers loosely-typed change notifications of the
//! shape `{"eventType": "INSERT" | "UPDATE" | "DELETE", "new": {...},
//! "old": {...}}`. [`RealtimeEvent::from_raw`] validates them into a
//! discriminated union at the subscription boundary; [`apply_event`] folds
//! one event into an ordered in-memory collection.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{raw_record_id, EntityId, Identified};

/// Raw change notification as delivered by the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChange {
    #[serde(rename = "eventType", alias = "type")]
    pub event_type: String,
    #[serde(default)]
    pub new: Option<serde_json::Value>,
    #[serde(default)]
    pub old: Option<serde_json::Value>,
}

/// Errors raised while validating a [`RawChange`].
#[derive(Debug, thiserror::Error)]
pub enum RealtimeParseError {
    #[error("Unknown realtime event type '{0}'")]
    UnknownEventType(String),

    #[error("{0} event is missing its record")]
    MissingRecord(&'static str),

    #[error("DELETE event record has no identifier")]
    MissingId,

    #[error("Invalid record payload: {0}")]
    InvalidRecord(#[from] serde_json::Error),
}

/// A validated change to a collection of `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent<T> {
    Insert(T),
    Update(T),
    Delete { id: EntityId },
}

impl<T: DeserializeOwned> RealtimeEvent<T> {
    pub fn from_raw(raw: RawChange) -> Result<Self, RealtimeParseError> {
        match raw.event_type.to_ascii_uppercase().as_str() {
            "INSERT" => {
                let record = non_empty(raw.new).ok_or(RealtimeParseError::MissingRecord("INSERT"))?;
                Ok(RealtimeEvent::Insert(serde_json::from_value(record)?))
            }
            "UPDATE" => {
                let record = non_empty(raw.new).ok_or(RealtimeParseError::MissingRecord("UPDATE"))?;
                Ok(RealtimeEvent::Update(serde_json::from_value(record)?))
            }
            "DELETE" => {
                let record = non_empty(raw.old).ok_or(RealtimeParseError::MissingRecord("DELETE"))?;
                let id = raw_record_id(&record).ok_or(RealtimeParseError::MissingId)?;
                Ok(RealtimeEvent::Delete { id })
            }
            _ => Err(RealtimeParseError::UnknownEventType(raw.event_type)),
        }
    }
}

impl<T: Identified> RealtimeEvent<T> {
    /// Identifier of the record this event refers to.
    pub fn record_id(&self) -> &str {
        match self {
            RealtimeEvent::Insert(r) | RealtimeEvent::Update(r) => r.id(),
            RealtimeEvent::Delete { id } => id.as_str(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RealtimeEvent::Insert(_) => "insert",
            RealtimeEvent::Update(_) => "update",
            RealtimeEvent::Delete { .. } => "delete",
        }
    }
}

/// Realtime payloads send `{}` for the side that does not apply.
fn non_empty(value: Option<serde_json::Value>) -> Option<serde_json::Value> {
    match value {
        Some(serde_json::Value::Object(map)) if map.is_empty() => None,
        Some(serde_json::Value::Null) | None => None,
        other => other,
    }
}

/// What [`apply_event`] did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Replaced,
    Removed,
    Unchanged,
}

/// Fold one event into `collection`, preserving insertion order.
///
/// - insert appends only if no record shares the identifier;
/// - update replaces the matching record in place;
/// - delete removes the matching record.
///
/// Update and delete of an unknown identifier leave the collection as is.
pub fn apply_event<T: Identified>(collection: &mut Vec<T>, event: RealtimeEvent<T>) -> Applied {
    match event {
        RealtimeEvent::Insert(record) => {
            if collection.iter().any(|r| r.id() == record.id()) {
                Applied::Unchanged
            } else {
                collection.push(record);
                Applied::Inserted
            }
        }
        RealtimeEvent::Update(record) => {
            match collection.iter_mut().find(|r| r.id() == record.id()) {
                Some(slot) => {
                    *slot = record;
                    Applied::Replaced
                }
                None => Applied::Unchanged,
            }
        }
        RealtimeEvent::Delete { id } => match collection.iter().position(|r| r.id() == id) {
            Some(index) => {
                collection.remove(index);
                Applied::Removed
            }
            None => Applied::Unchanged,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Rec {
        id: String,
        v: i32,
    }

    impl Identified for Rec {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn rec(id: &str, v: i32) -> Rec {
        Rec { id: id.into(), v }
    }

    #[test]
    fn insert_is_idempotent() {
        let mut once = vec![rec("a", 1)];
        apply_event(&mut once, RealtimeEvent::Insert(rec("b", 2)));

        let mut twice = vec![rec("a", 1)];
        apply_event(&mut twice, RealtimeEvent::Insert(rec("b", 2)));
        let second = apply_event(&mut twice, RealtimeEvent::Insert(rec("b", 2)));

        assert_eq!(second, Applied::Unchanged);
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 2);
    }

    #[test]
    fn insert_appends_in_arrival_order() {
        let mut items = Vec::new();
        for id in ["c", "a", "b"] {
            apply_event(&mut items, RealtimeEvent::Insert(rec(id, 0)));
        }
        let ids: Vec<&str> = items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut items = vec![rec("a", 1), rec("b", 2), rec("c", 3)];
        let applied = apply_event(&mut items, RealtimeEvent::Update(rec("b", 20)));
        assert_eq!(applied, Applied::Replaced);
        assert_eq!(items, vec![rec("a", 1), rec("b", 20), rec("c", 3)]);
    }

    #[test]
    fn update_and_delete_of_absent_id_are_noops() {
        let original = vec![rec("a", 1), rec("b", 2)];

        let mut items = original.clone();
        assert_eq!(
            apply_event(&mut items, RealtimeEvent::Update(rec("zz", 9))),
            Applied::Unchanged
        );
        assert_eq!(
            apply_event(&mut items, RealtimeEvent::Delete { id: "zz".into() }),
            Applied::Unchanged
        );
        assert_eq!(items, original);
    }

    #[test]
    fn delete_removes_matching_record() {
        let mut items = vec![rec("a", 1), rec("b", 2)];
        let applied = apply_event(&mut items, RealtimeEvent::Delete { id: "a".into() });
        assert_eq!(applied, Applied::Removed);
        assert_eq!(items, vec![rec("b", 2)]);
    }

    #[test]
    fn raw_insert_and_delete_are_validated() {
        let raw: RawChange = serde_json::from_value(json!({
            "eventType": "INSERT",
            "new": {"id": "a", "v": 1},
            "old": {}
        }))
        .unwrap();
        let event = RealtimeEvent::<Rec>::from_raw(raw).unwrap();
        assert_eq!(event, RealtimeEvent::Insert(rec("a", 1)));

        let raw: RawChange = serde_json::from_value(json!({
            "eventType": "delete",
            "new": {},
            "old": {"_id": "a"}
        }))
        .unwrap();
        let event = RealtimeEvent::<Rec>::from_raw(raw).unwrap();
        assert_eq!(event, RealtimeEvent::Delete { id: "a".into() });
    }

    #[test]
    fn malformed_raw_events_are_rejected() {
        let unknown = RawChange {
            event_type: "TRUNCATE".into(),
            new: None,
            old: None,
        };
        assert_matches!(
            RealtimeEvent::<Rec>::from_raw(unknown),
            Err(RealtimeParseError::UnknownEventType(t)) if t == "TRUNCATE"
        );

        let missing = RawChange {
            event_type: "UPDATE".into(),
            new: Some(json!({})),
            old: None,
        };
        assert_matches!(
            RealtimeEvent::<Rec>::from_raw(missing),
            Err(RealtimeParseError::MissingRecord("UPDATE"))
        );

        let bad = RawChange {
            event_type: "INSERT".into(),
            new: Some(json!({"id": "a"})),
            old: None,
        };
        assert_matches!(
            RealtimeEvent::<Rec>::from_raw(bad),
            Err(RealtimeParseError::InvalidRecord(_))
        );

        let no_id = RawChange {
            event_type: "DELETE".into(),
            new: None,
            old: Some(json!({"title": "gone"})),
        };
        assert_matches!(
            RealtimeEvent::<Rec>::from_raw(no_id),
            Err(RealtimeParseError::MissingId)
        );
    }
}
