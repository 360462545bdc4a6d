//! Task detail page controller.
//!
//! Owns the page state for one task and mediates every way it can change:
//! full reloads through the fetch gate, realtime events, and user
//! mutations. State sits behind a `std::sync::Mutex` that is only ever
//! locked between awaits.
//!
//! Background refreshes (polling, realtime) yield to the user: they are
//! skipped while a form is open, a deletion is awaiting confirmation, or a
//! mutation is in flight. Every fetch takes a generation number, and a
//! response that lost the race against a newer fetch is discarded. A
//! background refresh never starts while a forced one is still loading,
//! so it cannot supersede it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dataco_client::{ApiError, DashboardApi};
use dataco_core::bug_report::BugReport;
use dataco_core::forms::{validate_form, NewSubtask, SubtaskUpdate, TaskForm};
use dataco_core::interaction::EntityRef;
use dataco_core::realtime::{apply_event, Applied, RealtimeEvent};
use dataco_core::subtask::Subtask;
use dataco_core::tags::SubtaskType;
use dataco_core::task::Task;
use dataco_core::types::EntityId;
use tokio::sync::watch;

use crate::notice::{Notice, NoticeLevel, Notifier};
use crate::state::{PageState, Snapshot};
use crate::variant::PageVariant;

/// Result of one pass through the fetch gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Background refresh skipped because the user is interacting or a
    /// forced refresh is already loading.
    Skipped,
    /// Fresh data replaced the page state.
    Applied,
    /// The response arrived after a newer fetch started, or after the user
    /// started interacting, and was thrown away.
    Discarded,
    /// A read failed; the page error is set and nothing was applied.
    Failed,
    /// The session is missing or was rejected.
    LoginRequired,
}

/// Result of a user-initiated mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Completed,
    /// The task is gone; the caller should return to the task list.
    NavigateToTaskList,
    /// Rejected client-side before any request was sent.
    Invalid(String),
    /// Another mutation is still in flight.
    Busy,
    /// The server or the network failed. Carries the user-facing message.
    Failed(String),
    LoginRequired,
}

/// What happened to a realtime event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeOutcome {
    /// Dropped because the user is interacting. Not queued.
    Dropped,
    /// Not relevant to this page, or realtime is disabled for the variant.
    Ignored,
    Applied(Applied),
}

/// Side effects that follow a successful mutation.
#[derive(Debug, Clone, Copy)]
struct Effects {
    close_forms: bool,
    recalculate: bool,
    refresh: bool,
}

impl Effects {
    const FORM: Self = Self {
        close_forms: true,
        recalculate: false,
        refresh: true,
    };
    const SUBTASK_FORM: Self = Self {
        close_forms: true,
        recalculate: true,
        refresh: true,
    };
    const TOGGLE: Self = Self {
        close_forms: false,
        recalculate: false,
        refresh: true,
    };
}

pub struct TaskPageController<A> {
    api: Arc<A>,
    task_id: EntityId,
    variant: PageVariant,
    notifier: Arc<dyn Notifier>,
    state: Mutex<PageState>,
    generation: AtomicU64,
    /// Forced fetches currently loading.
    forced_in_flight: AtomicUsize,
    revision: watch::Sender<u64>,
}

impl<A: DashboardApi> TaskPageController<A> {
    pub fn new(
        api: Arc<A>,
        task_id: impl Into<EntityId>,
        variant: PageVariant,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            task_id: task_id.into(),
            variant,
            notifier,
            state: Mutex::new(PageState::default()),
            generation: AtomicU64::new(0),
            forced_in_flight: AtomicUsize::new(0),
            revision,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn variant(&self) -> &PageVariant {
        &self.variant
    }

    /// Copy of the current page state.
    pub fn state(&self) -> PageState {
        self.lock().clone()
    }

    /// Receiver that changes whenever the page state does.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn is_user_interacting(&self) -> bool {
        self.lock().interaction.is_user_interacting()
    }

    // -----------------------------------------------------------------------
    // Fetch gate
    // -----------------------------------------------------------------------

    /// Reload task, project and subtasks.
    ///
    /// Unforced fetches are skipped without any network call while the
    /// user is interacting or a forced fetch is loading.
    pub async fn fetch_data(&self, force_refresh: bool) -> FetchOutcome {
        if !force_refresh && self.is_user_interacting() {
            tracing::debug!(task_id = %self.task_id, "User interacting, skipping background refresh");
            return FetchOutcome::Skipped;
        }
        if !force_refresh && self.forced_in_flight.load(Ordering::SeqCst) > 0 {
            tracing::debug!(task_id = %self.task_id, "Forced refresh loading, skipping background refresh");
            return FetchOutcome::Skipped;
        }

        let _forced = force_refresh.then(|| ForcedFetch::start(&self.forced_in_flight));
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.load().await;

        let outcome = {
            let mut state = self.lock();
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(task_id = %self.task_id, generation, "Discarding stale fetch response");
                return FetchOutcome::Discarded;
            }
            if !force_refresh && state.interaction.is_user_interacting() {
                tracing::debug!(task_id = %self.task_id, "User started interacting, discarding background refresh");
                return FetchOutcome::Discarded;
            }

            match result {
                Ok(snapshot) => {
                    tracing::debug!(
                        task_id = %self.task_id,
                        subtasks = snapshot.subtasks.len(),
                        "Page data loaded",
                    );
                    state.apply_snapshot(snapshot);
                    FetchOutcome::Applied
                }
                Err(e) if e.is_unauthenticated() => {
                    state.login_required = true;
                    state.error = Some(e.user_message());
                    FetchOutcome::LoginRequired
                }
                Err(e) => {
                    tracing::warn!(task_id = %self.task_id, error = %e, "Failed to load page data");
                    state.error = Some(format!("Failed to load task data: {}", e.user_message()));
                    FetchOutcome::Failed
                }
            }
        };

        self.bump();
        outcome
    }

    /// Background refresh (polling, realtime). Yields to the user.
    pub async fn safe_refresh(&self) -> FetchOutcome {
        self.fetch_data(false).await
    }

    /// Explicit refresh (mount, refresh button, after a mutation).
    pub async fn force_refresh(&self) -> FetchOutcome {
        self.fetch_data(true).await
    }

    // -----------------------------------------------------------------------
    // Realtime
    // -----------------------------------------------------------------------

    pub fn handle_subtask_event(&self, event: RealtimeEvent<Subtask>) -> RealtimeOutcome {
        if !self.variant.realtime {
            return RealtimeOutcome::Ignored;
        }

        let applied = {
            let mut state = self.lock();
            if state.interaction.is_user_interacting() {
                tracing::debug!(
                    kind = event.kind(),
                    id = event.record_id(),
                    "User interacting, dropping realtime subtask event",
                );
                return RealtimeOutcome::Dropped;
            }

            let foreign = match &event {
                RealtimeEvent::Insert(s) | RealtimeEvent::Update(s) => s.task_id != self.task_id,
                RealtimeEvent::Delete { .. } => false,
            };
            if foreign {
                return RealtimeOutcome::Ignored;
            }

            apply_event(&mut state.subtasks, event)
        };

        if applied != Applied::Unchanged {
            self.bump();
        }
        RealtimeOutcome::Applied(applied)
    }

    pub fn handle_task_event(&self, event: RealtimeEvent<Task>) -> RealtimeOutcome {
        if !self.variant.realtime || event.record_id() != self.task_id {
            return RealtimeOutcome::Ignored;
        }

        let applied = {
            let mut state = self.lock();
            if state.interaction.is_user_interacting() {
                tracing::debug!(kind = event.kind(), "User interacting, dropping realtime task event");
                return RealtimeOutcome::Dropped;
            }

            match event {
                RealtimeEvent::Update(task) => {
                    state.task = Some(task);
                    Applied::Replaced
                }
                RealtimeEvent::Delete { .. } => {
                    tracing::info!(task_id = %self.task_id, "Task deleted remotely");
                    state.clear_task();
                    Applied::Removed
                }
                // A task cannot be inserted under an id this page already shows.
                RealtimeEvent::Insert(_) => Applied::Unchanged,
            }
        };

        if applied != Applied::Unchanged {
            self.bump();
        }
        RealtimeOutcome::Applied(applied)
    }

    // -----------------------------------------------------------------------
    // Forms and confirmations
    // -----------------------------------------------------------------------

    pub fn open_create_form(&self) {
        self.update(|s| s.interaction.create_form_open = true);
    }

    pub fn open_edit(&self, target: EntityRef) {
        self.update(|s| s.interaction.edit_target = Some(target));
    }

    pub fn request_delete(&self, target: EntityRef) {
        self.update(|s| s.interaction.pending_delete = Some(target));
    }

    pub fn cancel_delete(&self) {
        self.update(|s| s.interaction.pending_delete = None);
    }

    pub fn close_forms(&self) {
        self.update(|s| s.interaction.close_forms());
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn create_subtask(&self, form: NewSubtask) -> MutationOutcome {
        if form.task_id != self.task_id {
            return self.invalid("Subtask must belong to the task shown on this page".into());
        }
        if let Err(outcome) = self.check_subtask_type(form.subtask_type) {
            return outcome;
        }
        if let Err(e) = validate_form(&form) {
            return self.invalid(e.to_string());
        }

        self.run_mutation("create_subtask", Effects::SUBTASK_FORM, "Subtask created", || {
            self.api.create_subtask(&form)
        })
        .await
    }

    pub async fn update_subtask(&self, subtask_id: &str, form: SubtaskUpdate) -> MutationOutcome {
        if let Err(outcome) = self.check_subtask_type(form.subtask_type) {
            return outcome;
        }
        if let Err(e) = validate_form(&form) {
            return self.invalid(e.to_string());
        }

        self.run_mutation("update_subtask", Effects::SUBTASK_FORM, "Subtask updated", || {
            self.api.update_subtask(subtask_id, &form)
        })
        .await
    }

    /// Delete a subtask whose deletion the user has confirmed via
    /// [`request_delete`](Self::request_delete).
    pub async fn delete_subtask(&self, subtask_id: &str) -> MutationOutcome {
        if !self.is_pending_delete(&EntityRef::Subtask(subtask_id.to_string())) {
            return self.invalid("Confirm the deletion before deleting this subtask".into());
        }

        self.run_mutation("delete_subtask", Effects::SUBTASK_FORM, "Subtask deleted", || {
            self.api.delete_subtask(subtask_id)
        })
        .await
    }

    pub async fn update_task(&self, form: TaskForm) -> MutationOutcome {
        if let Err(e) = validate_form(&form) {
            return self.invalid(e.to_string());
        }

        self.run_mutation("update_task", Effects::FORM, "Task updated", || {
            self.api.update_task(&self.task_id, &form)
        })
        .await
    }

    /// Delete the page's task after confirmation. On success the page data
    /// is cleared and the caller should navigate to the task list.
    pub async fn delete_task(&self) -> MutationOutcome {
        if !self.is_pending_delete(&EntityRef::Task(self.task_id.clone())) {
            return self.invalid("Confirm the deletion before deleting this task".into());
        }

        let Some(_in_flight) = self.begin_mutation() else {
            return MutationOutcome::Busy;
        };

        match self.api.delete_task(&self.task_id).await {
            Ok(()) => {
                tracing::info!(task_id = %self.task_id, "Task deleted");
                self.update(|s| {
                    s.interaction.close_forms();
                    s.clear_task();
                });
                self.notify(NoticeLevel::Success, "Task deleted".into());
                MutationOutcome::NavigateToTaskList
            }
            Err(e) => self.mutation_failed("delete_task", e),
        }
    }

    pub async fn set_task_visibility(&self, visible: bool) -> MutationOutcome {
        let message = if visible { "Task is now visible" } else { "Task is now hidden" };
        self.run_mutation("set_task_visibility", Effects::TOGGLE, message, || {
            self.api.set_task_visibility(&self.task_id, visible)
        })
        .await
    }

    /// Flip the task's visibility based on the last loaded state.
    pub async fn toggle_task_visibility(&self) -> MutationOutcome {
        let current = self.lock().task.as_ref().map(|t| t.is_visible);
        match current {
            Some(visible) => self.set_task_visibility(!visible).await,
            None => self.invalid("Task is not loaded".into()),
        }
    }

    pub async fn set_subtask_visibility(&self, subtask_id: &str, visible: bool) -> MutationOutcome {
        let message = if visible { "Subtask is now visible" } else { "Subtask is now hidden" };
        self.run_mutation("set_subtask_visibility", Effects::TOGGLE, message, || {
            self.api.set_subtask_visibility(subtask_id, visible)
        })
        .await
    }

    pub async fn toggle_subtask_visibility(&self, subtask_id: &str) -> MutationOutcome {
        let current = self.lock().subtask(subtask_id).map(Subtask::is_visible);
        match current {
            Some(visible) => self.set_subtask_visibility(subtask_id, !visible).await,
            None => self.invalid(format!("Subtask {subtask_id} is not on this page")),
        }
    }

    /// Ask the server to recompute the task's amount. Failures are logged
    /// and otherwise ignored.
    pub async fn recalculate_amount(&self) {
        if let Err(e) = self.api.recalculate_amount(&self.task_id).await {
            tracing::warn!(task_id = %self.task_id, error = %e, "Amount recalculation failed");
        }
    }

    /// File a bug report from this page. The in-flight flag guards against
    /// double submission like any other mutation.
    pub async fn submit_bug_report(&self, mut report: BugReport) -> MutationOutcome {
        let Some(_in_flight) = self.begin_mutation() else {
            return MutationOutcome::Busy;
        };
        report.page.get_or_insert_with(|| format!("tasks/{}", self.task_id));

        let outcome = submit_bug_report(&*self.api, report, &*self.notifier, &self.variant).await;
        match outcome {
            MutationOutcome::Completed => self.close_forms(),
            MutationOutcome::LoginRequired => self.update(|s| s.login_required = true),
            _ => {}
        }
        outcome
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn update(&self, f: impl FnOnce(&mut PageState)) {
        f(&mut self.lock());
        self.bump();
    }

    async fn load(&self) -> Result<Snapshot, ApiError> {
        let (task, subtasks) = tokio::try_join!(
            self.api.get_task(&self.task_id),
            self.api.list_subtasks(&self.task_id),
        )?;
        let project = self.api.get_project(&task.project_id).await?;
        Ok(Snapshot {
            task,
            project,
            subtasks,
        })
    }

    fn is_pending_delete(&self, target: &EntityRef) -> bool {
        self.lock().interaction.pending_delete.as_ref() == Some(target)
    }

    fn check_subtask_type(&self, subtask_type: SubtaskType) -> Result<(), MutationOutcome> {
        if subtask_type == SubtaskType::Loops && !self.variant.allow_loops_type {
            return Err(self.invalid("Subtask type 'loops' is not available on this page".into()));
        }
        Ok(())
    }

    /// Mark a mutation as in flight. `None` if one already is.
    fn begin_mutation(&self) -> Option<InFlight<'_, A>> {
        {
            let mut state = self.lock();
            if state.interaction.mutation_in_flight {
                return None;
            }
            state.interaction.mutation_in_flight = true;
        }
        self.bump();
        Some(InFlight { controller: self })
    }

    async fn run_mutation<F, Fut>(
        &self,
        action: &'static str,
        effects: Effects,
        success_message: &str,
        request: F,
    ) -> MutationOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let Some(_in_flight) = self.begin_mutation() else {
            tracing::debug!(action, "Mutation already in flight, ignoring submit");
            return MutationOutcome::Busy;
        };

        match request().await {
            Ok(()) => {
                tracing::info!(task_id = %self.task_id, action, "Mutation succeeded");
                if effects.close_forms {
                    self.update(|s| s.interaction.close_forms());
                }
                if effects.recalculate && self.variant.recalculate_amount {
                    self.recalculate_amount().await;
                }
                if effects.refresh {
                    self.force_refresh().await;
                }
                self.notify(NoticeLevel::Success, success_message.to_string());
                MutationOutcome::Completed
            }
            Err(e) => self.mutation_failed(action, e),
        }
    }

    fn mutation_failed(&self, action: &'static str, err: ApiError) -> MutationOutcome {
        let message = err.user_message();
        if err.is_unauthenticated() {
            tracing::warn!(action, "Mutation refused, login required");
            self.update(|s| s.login_required = true);
            self.notify(NoticeLevel::Error, message);
            return MutationOutcome::LoginRequired;
        }

        tracing::warn!(task_id = %self.task_id, action, error = %err, "Mutation failed");
        self.notify(NoticeLevel::Error, message.clone());
        MutationOutcome::Failed(message)
    }

    fn invalid(&self, message: String) -> MutationOutcome {
        self.notify(NoticeLevel::Error, message.clone());
        MutationOutcome::Invalid(message)
    }

    fn notify(&self, level: NoticeLevel, message: String) {
        notice(&*self.notifier, &self.variant, level, message);
    }
}

/// Clears the in-flight flag when dropped, whichever way the mutation ends.
/// Counts a forced fetch as loading until dropped, cancellation included.
struct ForcedFetch<'a>(&'a AtomicUsize);

impl<'a> ForcedFetch<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ForcedFetch<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct InFlight<'a, A: DashboardApi> {
    controller: &'a TaskPageController<A>,
}

impl<A: DashboardApi> Drop for InFlight<'_, A> {
    fn drop(&mut self) {
        self.controller.lock().interaction.mutation_in_flight = false;
        self.controller.bump();
    }
}

/// Create a task under an existing project.
///
/// Lives outside [`TaskPageController`] because there is no task page yet.
pub async fn create_task<A: DashboardApi + ?Sized>(
    api: &A,
    form: TaskForm,
    notifier: &dyn Notifier,
    variant: &PageVariant,
) -> MutationOutcome {
    if let Err(e) = validate_form(&form) {
        return standalone_failure(notifier, variant, MutationOutcome::Invalid(e.to_string()));
    }

    match create_in_existing_project(api, &form).await {
        Ok(None) => {
            tracing::info!(project_id = %form.project_id, title = %form.title, "Task created");
            notice(notifier, variant, NoticeLevel::Success, "Task created".into());
            MutationOutcome::Completed
        }
        Ok(Some(message)) => standalone_failure(notifier, variant, MutationOutcome::Invalid(message)),
        Err(e) => {
            tracing::warn!(project_id = %form.project_id, error = %e, "Task creation failed");
            standalone_failure(notifier, variant, api_failure(&e))
        }
    }
}

/// File a bug report from anywhere in the dashboard.
pub async fn submit_bug_report<A: DashboardApi + ?Sized>(
    api: &A,
    report: BugReport,
    notifier: &dyn Notifier,
    variant: &PageVariant,
) -> MutationOutcome {
    let report = match report.normalized() {
        Ok(report) => report,
        Err(e) => return standalone_failure(notifier, variant, MutationOutcome::Invalid(e.to_string())),
    };

    match api.submit_bug_report(&report).await {
        Ok(()) => {
            tracing::info!(severity = %report.severity, "Bug report submitted");
            notice(notifier, variant, NoticeLevel::Success, "Bug report submitted".into());
            MutationOutcome::Completed
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bug report submission failed");
            standalone_failure(notifier, variant, api_failure(&e))
        }
    }
}

fn api_failure(err: &ApiError) -> MutationOutcome {
    if err.is_unauthenticated() {
        MutationOutcome::LoginRequired
    } else {
        MutationOutcome::Failed(err.user_message())
    }
}

fn standalone_failure(notifier: &dyn Notifier, variant: &PageVariant, outcome: MutationOutcome) -> MutationOutcome {
    let message = match &outcome {
        MutationOutcome::Invalid(message) | MutationOutcome::Failed(message) => message.clone(),
        MutationOutcome::LoginRequired => ApiError::Unauthenticated(String::new()).user_message(),
        _ => return outcome,
    };
    notice(notifier, variant, NoticeLevel::Error, message);
    outcome
}

fn notice(notifier: &dyn Notifier, variant: &PageVariant, level: NoticeLevel, message: String) {
    notifier.notify(Notice {
        style: variant.notice_style,
        level,
        message,
    });
}

/// `Ok(Some(message))` when the project does not exist.
async fn create_in_existing_project<A: DashboardApi + ?Sized>(
    api: &A,
    form: &TaskForm,
) -> Result<Option<String>, ApiError> {
    let projects = api.list_projects().await?;
    if !projects.iter().any(|p| p.id == form.project_id) {
        return Ok(Some(format!("Project {} does not exist", form.project_id)));
    }
    api.create_task(form).await?;
    Ok(None)
}
