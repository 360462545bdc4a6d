//! Task wire model.

use serde::{Deserialize, Serialize};

use crate::dataco::display_dataco;
use crate::priority::Priority;
use crate::tags::{DayTime, TaskType};
use crate::types::{one_or_many, record_serde, string_or_number, EntityId, Identified, Timestamp};

/// Free-text description block shown on the task page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescription {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub how_to_execute: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, alias = "image", deserialize_with = "one_or_many")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub dataco_number: String,
    #[serde(default)]
    pub description: TaskDescription,
    #[serde(alias = "project")]
    pub project_id: EntityId,
    #[serde(rename = "type", default)]
    pub task_types: Vec<TaskType>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub amount_needed: i64,
    #[serde(default)]
    pub target_car: Vec<String>,
    #[serde(default)]
    pub lidar: bool,
    #[serde(default)]
    pub day_time: Vec<DayTime>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

record_serde!(Task);

fn visible_by_default() -> bool {
    true
}

impl Task {
    pub fn display_dataco(&self) -> String {
        display_dataco(&self.dataco_number)
    }
}

impl Identified for Task {
    fn id(&self) -> &str {
        &self.id
    }
}
