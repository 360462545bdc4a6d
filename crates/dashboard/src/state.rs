//! In-memory state of one task page.

use dataco_core::interaction::InteractionState;
use dataco_core::project::Project;
use dataco_core::subtask::Subtask;
use dataco_core::task::Task;

/// Everything a full read returns. Applied as a unit or not at all.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub task: Task,
    pub project: Project,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub task: Option<Task>,
    pub project: Option<Project>,
    /// Ordered by arrival; realtime inserts append.
    pub subtasks: Vec<Subtask>,
    /// Page-level error from the last failed load.
    pub error: Option<String>,
    /// Set once the session turns out to be missing or rejected.
    pub login_required: bool,
    /// The task was deleted (locally or remotely).
    pub task_deleted: bool,
    pub interaction: InteractionState,
}

impl PageState {
    /// Replace all collections wholesale. A successful read also clears
    /// the error and the login and deletion flags.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.task = Some(snapshot.task);
        self.project = Some(snapshot.project);
        self.subtasks = snapshot.subtasks;
        self.error = None;
        self.login_required = false;
        self.task_deleted = false;
    }

    pub fn clear_task(&mut self) {
        self.task = None;
        self.project = None;
        self.subtasks.clear();
        self.task_deleted = true;
    }

    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    /// Sum of the subtasks' required amounts, as shown next to the task's
    /// own `amountNeeded`.
    pub fn subtask_amount_total(&self) -> i64 {
        self.subtasks.iter().map(|s| s.amount_needed).sum()
    }
}
