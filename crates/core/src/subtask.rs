use serde::{Deserialize, Serialize};

use crate::dataco::display_dataco;
use crate::tags::{DayTime, Scene, SubtaskType, Weather};
use crate::types::{one_or_many, record_serde, string_or_number, EntityId, Identified, Timestamp};

/// A unit of collection work under a [`Task`](crate::task::Task).
///
/// `target_car` is copied from the parent task when the subtask is created
/// and is never sent back on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Subtask {
    #[serde(rename = "_id")]
    pub id: EntityId,
    #[serde(alias = "task")]
    pub task_id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, alias = "image", deserialize_with = "one_or_many")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dataco_number: String,
    #[serde(rename = "type")]
    pub subtask_type: SubtaskType,
    #[serde(default)]
    pub amount_needed: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub target_car: Vec<String>,
    pub weather: Weather,
    pub scene: Scene,
    #[serde(default)]
    pub day_time: Vec<DayTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

record_serde!(Subtask);

impl Subtask {
    pub fn display_dataco(&self) -> String {
        display_dataco(&self.dataco_number)
    }

    /// Subtasks without an explicit flag are shown.
    pub fn is_visible(&self) -> bool {
        self.is_visible.unwrap_or(true)
    }
}

impl Identified for Subtask {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_enum_spellings_from_server() {
        let sub: Subtask = serde_json::from_value(json!({
            "_id": "s1",
            "taskId": "t1",
            "title": "Rainy suburbs",
            "datacoNumber": "77",
            "type": "loops",
            "amountNeeded": 3,
            "labels": ["wet road"],
            "targetCar": ["car-1"],
            "weather": "Rain",
            "scene": "Sub-Urban"
        }))
        .unwrap();

        assert_eq!(sub.subtask_type, SubtaskType::Loops);
        assert_eq!(sub.weather, Weather::Rain);
        assert_eq!(sub.scene, Scene::SubUrban);
        assert!(sub.day_time.is_empty());
        assert!(sub.is_visible());
    }

    #[test]
    fn unknown_weather_fails_to_parse() {
        let result = serde_json::from_value::<Subtask>(json!({
            "_id": "s1",
            "taskId": "t1",
            "title": "x",
            "type": "events",
            "weather": "Hail",
            "scene": "Urban"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn underscore_id_wins_over_virtual_id() {
        let sub: Subtask = serde_json::from_value(json!({
            "_id": "s1",
            "id": "ignored",
            "taskId": "t1",
            "title": "Both keys",
            "type": "events",
            "weather": "Clear",
            "scene": "Urban"
        }))
        .unwrap();
        assert_eq!(sub.id, "s1");
    }
}
