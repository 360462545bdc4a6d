//! Shared primitive types and serde helpers for the wire models.

use serde::{Deserialize, Deserializer};

/// Entity identifiers are opaque strings assigned by the server.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Anything that carries a server-assigned identifier.
///
/// Used by the realtime reducer to deduplicate and match records.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Accept a single string, a list of strings, or `null` for fields the
/// server sends as either `image` or `images`.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// DATACO numbers are stored as digit strings, but older records carry
/// them as JSON numbers.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Str(String),
        Num(u64),
    }

    Ok(match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => String::new(),
        Some(StringOrNumber::Str(s)) => s,
        Some(StringOrNumber::Num(n)) => n.to_string(),
    })
}

/// Extract the identifier from a raw JSON record (`_id` or `id`).
pub fn raw_record_id(record: &serde_json::Value) -> Option<EntityId> {
    ["_id", "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Fold a record's `id` key into `_id`.
///
/// Records serialized with virtuals carry both keys; `_id` wins and `id`
/// is dropped. A record with only `id` has it renamed to `_id`.
pub fn fold_record_id(mut record: serde_json::Value) -> serde_json::Value {
    if let serde_json::Value::Object(map) = &mut record {
        let fallback = map.remove("id");
        let has_primary = map.get("_id").is_some_and(|v| !v.is_null());
        if let (false, Some(fallback)) = (has_primary, fallback) {
            map.insert("_id".to_string(), fallback);
        }
    }
    record
}

/// Implement `Serialize`/`Deserialize` for a model declared with
/// `#[serde(remote = "Self")]`, folding `id` into `_id` on the way in.
macro_rules! record_serde {
    ($name:ident) => {
        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                $name::serialize(self, serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let record = <::serde_json::Value as ::serde::Deserialize>::deserialize(deserializer)?;
                $name::deserialize($crate::types::fold_record_id(record))
                    .map_err(<D::Error as ::serde::de::Error>::custom)
            }
        }
    };
}

pub(crate) use record_serde;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "one_or_many")]
        images: Vec<String>,
        #[serde(default, deserialize_with = "string_or_number")]
        number: String,
    }

    #[test]
    fn one_or_many_accepts_all_shapes() {
        let h: Holder = serde_json::from_value(json!({"images": "a.png"})).unwrap();
        assert_eq!(h.images, vec!["a.png"]);
        let h: Holder = serde_json::from_value(json!({"images": ["a", "b"]})).unwrap();
        assert_eq!(h.images.len(), 2);
        let h: Holder = serde_json::from_value(json!({"images": null})).unwrap();
        assert!(h.images.is_empty());
        let h: Holder = serde_json::from_value(json!({})).unwrap();
        assert!(h.images.is_empty());
    }

    #[test]
    fn numeric_dataco_is_stringified() {
        let h: Holder = serde_json::from_value(json!({"number": 4512})).unwrap();
        assert_eq!(h.number, "4512");
    }

    #[test]
    fn raw_record_id_prefers_underscore_id() {
        assert_eq!(
            raw_record_id(&json!({"_id": "abc", "id": "def"})).as_deref(),
            Some("abc")
        );
        assert_eq!(raw_record_id(&json!({"id": 7})).as_deref(), Some("7"));
        assert_eq!(raw_record_id(&json!({"_id": ""})), None);
        assert_eq!(raw_record_id(&json!({"title": "x"})), None);
    }

    #[test]
    fn fold_record_id_keeps_underscore_id() {
        assert_eq!(
            fold_record_id(json!({"_id": "abc", "id": "abc", "title": "x"})),
            json!({"_id": "abc", "title": "x"})
        );
        assert_eq!(fold_record_id(json!({"id": "def"})), json!({"_id": "def"}));
        assert_eq!(fold_record_id(json!({"_id": null, "id": "def"})), json!({"_id": "def"}));
        assert_eq!(fold_record_id(json!(["id"])), json!(["id"]));
    }
}
