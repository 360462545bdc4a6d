//! In-memory admin API shared by the dashboard integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dataco_client::{ApiError, DashboardApi};
use dataco_core::bug_report::BugReport;
use dataco_core::forms::{NewSubtask, SubtaskUpdate, TaskForm};
use dataco_core::project::Project;
use dataco_core::subtask::Subtask;
use dataco_core::task::Task;
use dataco_dashboard::{Notice, PageVariant, TaskPageController};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

pub const TASK_ID: &str = "t1";
pub const PROJECT_ID: &str = "p1";

pub fn task(amount_needed: i64) -> Task {
    serde_json::from_value(json!({
        "_id": TASK_ID,
        "title": "Night highway",
        "datacoNumber": 4821,
        "project": PROJECT_ID,
        "type": ["events"],
        "amountNeeded": amount_needed,
        "targetCar": ["Car-A", "Car-B"],
        "priority": 2,
    }))
    .unwrap()
}

pub fn subtask(id: &str, task_id: &str, amount_needed: i64) -> Subtask {
    serde_json::from_value(json!({
        "_id": id,
        "taskId": task_id,
        "title": format!("Subtask {id}"),
        "datacoNumber": "100",
        "type": "events",
        "amountNeeded": amount_needed,
        "weather": "Clear",
        "scene": "Urban",
    }))
    .unwrap()
}

fn project() -> Project {
    serde_json::from_value(json!({"_id": PROJECT_ID, "name": "Perception"})).unwrap()
}

/// Behaves like a small admin API server: mutations change the data that
/// later reads return.
pub struct MockApi {
    pub task: Mutex<Task>,
    pub subtasks: Mutex<Vec<Subtask>>,
    pub projects: Vec<Project>,
    calls: Mutex<Vec<&'static str>>,
    read_failure: Mutex<Option<fn() -> ApiError>>,
    mutation_failure: Mutex<Option<fn() -> ApiError>>,
    holds: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
    pub created: Mutex<Vec<NewSubtask>>,
    pub visibility: Mutex<Vec<(String, bool)>>,
    pub bug_reports: Mutex<Vec<BugReport>>,
    next_id: Mutex<u32>,
}

impl MockApi {
    pub fn new(task: Task, subtasks: Vec<Subtask>) -> Self {
        Self {
            task: Mutex::new(task),
            subtasks: Mutex::new(subtasks),
            projects: vec![project()],
            calls: Mutex::default(),
            read_failure: Mutex::default(),
            mutation_failure: Mutex::default(),
            holds: Mutex::default(),
            created: Mutex::default(),
            visibility: Mutex::default(),
            bug_reports: Mutex::default(),
            next_id: Mutex::new(100),
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn fail_reads_with(&self, failure: Option<fn() -> ApiError>) {
        *self.read_failure.lock().unwrap() = failure;
    }

    pub fn fail_mutations_with(&self, failure: Option<fn() -> ApiError>) {
        *self.mutation_failure.lock().unwrap() = failure;
    }

    /// Make the next `name` call wait until the returned sender fires.
    /// The call's data is captured before it starts waiting.
    pub fn hold_next(&self, name: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(name, rx);
        tx
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    async fn wait_if_held(&self, name: &'static str) {
        let hold = self.holds.lock().unwrap().remove(name);
        if let Some(rx) = hold {
            let _ = rx.await;
        }
    }

    fn read_result(&self) -> Result<(), ApiError> {
        match *self.read_failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }

    fn mutation_result(&self) -> Result<(), ApiError> {
        match *self.mutation_failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DashboardApi for MockApi {
    async fn get_task(&self, _task_id: &str) -> Result<Task, ApiError> {
        self.record("get_task");
        let result = self.read_result().map(|()| self.task.lock().unwrap().clone());
        self.wait_if_held("get_task").await;
        result
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.record("get_project");
        self.read_result()?;
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: r#"{"error":"Project not found"}"#.into(),
            })
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>, ApiError> {
        self.record("list_subtasks");
        let result = self.read_result().map(|()| {
            self.subtasks
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.task_id == task_id)
                .cloned()
                .collect()
        });
        self.wait_if_held("list_subtasks").await;
        result
    }

    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.record("list_projects");
        self.read_result()?;
        Ok(self.projects.clone())
    }

    async fn create_task(&self, _form: &TaskForm) -> Result<(), ApiError> {
        self.record("create_task");
        self.mutation_result()
    }

    async fn update_task(&self, _task_id: &str, form: &TaskForm) -> Result<(), ApiError> {
        self.record("update_task");
        self.wait_if_held("update_task").await;
        self.mutation_result()?;
        let mut task = self.task.lock().unwrap();
        task.title = form.title.clone();
        task.amount_needed = form.amount_needed;
        Ok(())
    }

    async fn delete_task(&self, _task_id: &str) -> Result<(), ApiError> {
        self.record("delete_task");
        self.mutation_result()?;
        self.subtasks.lock().unwrap().clear();
        Ok(())
    }

    async fn set_task_visibility(&self, task_id: &str, visible: bool) -> Result<(), ApiError> {
        self.record("set_task_visibility");
        self.mutation_result()?;
        self.visibility.lock().unwrap().push((task_id.to_string(), visible));
        self.task.lock().unwrap().is_visible = visible;
        Ok(())
    }

    async fn create_subtask(&self, form: &NewSubtask) -> Result<(), ApiError> {
        self.record("create_subtask");
        self.wait_if_held("create_subtask").await;
        self.mutation_result()?;

        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("s{next}")
        };
        let mut created = subtask(&id, &form.task_id, form.amount_needed);
        created.title = form.title.clone();
        created.subtask_type = form.subtask_type;
        created.target_car = form.target_car().to_vec();
        self.subtasks.lock().unwrap().push(created);
        self.created.lock().unwrap().push(form.clone());
        Ok(())
    }

    async fn update_subtask(&self, subtask_id: &str, form: &SubtaskUpdate) -> Result<(), ApiError> {
        self.record("update_subtask");
        self.mutation_result()?;
        let mut subtasks = self.subtasks.lock().unwrap();
        if let Some(s) = subtasks.iter_mut().find(|s| s.id == subtask_id) {
            s.title = form.title.clone();
            s.amount_needed = form.amount_needed;
        }
        Ok(())
    }

    async fn delete_subtask(&self, subtask_id: &str) -> Result<(), ApiError> {
        self.record("delete_subtask");
        self.mutation_result()?;
        self.subtasks.lock().unwrap().retain(|s| s.id != subtask_id);
        Ok(())
    }

    async fn set_subtask_visibility(&self, subtask_id: &str, visible: bool) -> Result<(), ApiError> {
        self.record("set_subtask_visibility");
        self.mutation_result()?;
        self.visibility.lock().unwrap().push((subtask_id.to_string(), visible));
        let mut subtasks = self.subtasks.lock().unwrap();
        if let Some(s) = subtasks.iter_mut().find(|s| s.id == subtask_id) {
            s.is_visible = Some(visible);
        }
        Ok(())
    }

    async fn recalculate_amount(&self, task_id: &str) -> Result<(), ApiError> {
        self.record("recalculate_amount");
        let total = self
            .subtasks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.task_id == task_id)
            .map(|s| s.amount_needed)
            .sum();
        self.task.lock().unwrap().amount_needed = total;
        Ok(())
    }

    async fn submit_bug_report(&self, report: &BugReport) -> Result<(), ApiError> {
        self.record("submit_bug_report");
        self.mutation_result()?;
        self.bug_reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

pub type Page = Arc<TaskPageController<MockApi>>;

/// A page over `api`, with notices captured on the returned receiver.
pub fn page(api: &Arc<MockApi>, variant: PageVariant) -> (Page, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = TaskPageController::new(api.clone(), TASK_ID, variant, Arc::new(tx));
    (Arc::new(controller), rx)
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
