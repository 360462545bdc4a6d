//! Request payloads for task and subtask mutations.
//!
//! Each payload derives [`Validate`]; call [`validate_form`] before sending
//! so required fields are checked client-side.

use std::borrow::Cow;

use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::dataco::sanitize_dataco_input;
use crate::error::CoreError;
use crate::priority::Priority;
use crate::subtask::Subtask;
use crate::tags::{DayTime, Scene, SubtaskType, TaskType, Weather};
use crate::task::{Task, TaskDescription};
use crate::types::EntityId;

/// Run the derived validation rules and flatten failures into a
/// [`CoreError::Validation`].
pub fn validate_form<T: Validate>(form: &T) -> Result<(), CoreError> {
    form.validate().map_err(CoreError::from)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("is required")));
    }
    Ok(())
}

fn dataco_digits(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed("is required")));
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("digits")
            .with_message(Cow::Borrowed("must contain digits only")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Full task form, used for both create (`POST /api/tasks`) and update
/// (`PUT /api/tasks/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[validate(custom(function = not_blank))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[validate(custom(function = dataco_digits))]
    pub dataco_number: String,
    pub description: TaskDescription,
    #[validate(custom(function = not_blank))]
    pub project_id: EntityId,
    #[serde(rename = "type")]
    pub task_types: Vec<TaskType>,
    pub locations: Vec<String>,
    #[validate(range(min = 0))]
    pub amount_needed: i64,
    pub target_car: Vec<String>,
    pub lidar: bool,
    pub day_time: Vec<DayTime>,
    pub priority: Priority,
    pub is_visible: bool,
}

impl TaskForm {
    /// Empty creation form bound to an existing project.
    pub fn for_project(project_id: impl Into<EntityId>) -> Self {
        Self {
            title: String::new(),
            subtitle: None,
            dataco_number: String::new(),
            description: TaskDescription::default(),
            project_id: project_id.into(),
            task_types: Vec::new(),
            locations: Vec::new(),
            amount_needed: 0,
            target_car: Vec::new(),
            lidar: false,
            day_time: Vec::new(),
            priority: Priority::NONE,
            is_visible: true,
        }
    }

    /// Edit form pre-filled from the current task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            subtitle: task.subtitle.clone(),
            dataco_number: task.dataco_number.clone(),
            description: task.description.clone(),
            project_id: task.project_id.clone(),
            task_types: task.task_types.clone(),
            locations: task.locations.clone(),
            amount_needed: task.amount_needed,
            target_car: task.target_car.clone(),
            lidar: task.lidar,
            day_time: task.day_time.clone(),
            priority: task.priority,
            is_visible: task.is_visible,
        }
    }

    /// Set the DATACO number from raw user input, keeping digits only.
    pub fn set_dataco_input(&mut self, raw: &str) {
        self.dataco_number = sanitize_dataco_input(raw);
    }
}

// ---------------------------------------------------------------------------
// Subtask
// ---------------------------------------------------------------------------

/// Subtask creation payload (`POST /api/subtasks`).
///
/// Build with [`NewSubtask::for_task`] so `target_car` is inherited from
/// the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    #[validate(custom(function = not_blank))]
    pub task_id: EntityId,
    #[validate(custom(function = not_blank))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[validate(custom(function = dataco_digits))]
    pub dataco_number: String,
    #[serde(rename = "type")]
    pub subtask_type: SubtaskType,
    #[validate(range(min = 0))]
    pub amount_needed: i64,
    pub labels: Vec<String>,
    target_car: Vec<String>,
    pub weather: Weather,
    pub scene: Scene,
    pub day_time: Vec<DayTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

impl NewSubtask {
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            title: String::new(),
            subtitle: None,
            dataco_number: String::new(),
            subtask_type: SubtaskType::Events,
            amount_needed: 0,
            labels: Vec::new(),
            target_car: task.target_car.clone(),
            weather: Weather::Mixed,
            scene: Scene::Mixed,
            day_time: Vec::new(),
            is_visible: None,
        }
    }

    /// Vehicles inherited from the parent task. Read-only.
    pub fn target_car(&self) -> &[String] {
        &self.target_car
    }

    pub fn set_dataco_input(&mut self, raw: &str) {
        self.dataco_number = sanitize_dataco_input(raw);
    }
}

/// Subtask update payload (`PUT /api/subtasks/{id}`).
///
/// Carries no `targetCar` and no `taskId`: both are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskUpdate {
    #[validate(custom(function = not_blank))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[validate(custom(function = dataco_digits))]
    pub dataco_number: String,
    #[serde(rename = "type")]
    pub subtask_type: SubtaskType,
    #[validate(range(min = 0))]
    pub amount_needed: i64,
    pub labels: Vec<String>,
    pub weather: Weather,
    pub scene: Scene,
    pub day_time: Vec<DayTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}

impl SubtaskUpdate {
    pub fn from_subtask(subtask: &Subtask) -> Self {
        Self {
            title: subtask.title.clone(),
            subtitle: subtask.subtitle.clone(),
            dataco_number: subtask.dataco_number.clone(),
            subtask_type: subtask.subtask_type,
            amount_needed: subtask.amount_needed,
            labels: subtask.labels.clone(),
            weather: subtask.weather,
            scene: subtask.scene,
            day_time: subtask.day_time.clone(),
            is_visible: subtask.is_visible,
        }
    }

    pub fn set_dataco_input(&mut self, raw: &str) {
        self.dataco_number = sanitize_dataco_input(raw);
    }
}

/// Body of the visibility toggle endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityUpdate {
    pub is_visible: bool,
}
