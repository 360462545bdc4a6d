//! `dataco-admin` -- command-line front end for the DATACO admin dashboard.
//!
//! Every API command loads the task page first (the same way the web page
//! does on mount) and then runs one operation against it.
//!
//! # Environment variables
//!
//! See [`DashboardConfig::from_env`]. `RUST_LOG` overrides the default
//! log filter.

mod cli;

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use dataco_client::session::{TOKEN_KEY, USER_KEY};
use dataco_client::{AdminApi, AuthContext, DashboardApi, SessionStore};
use dataco_core::bug_report::BugReport;
use dataco_core::forms::{NewSubtask, SubtaskUpdate, TaskForm};
use dataco_core::interaction::EntityRef;
use dataco_core::priority::Priority;
use dataco_core::user::AdminUser;
use dataco_dashboard::{
    create_task, run_page, submit_bug_report, DashboardConfig, DashboardError, FetchOutcome, LogNotifier,
    MutationOutcome, PageState, TaskPageController, Triggers,
};
use dataco_events::{RealtimeHub, RealtimeSubscription};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, SessionCommands, SubtaskCommands, SubtaskFields, TaskCommands, TaskFields};

type Controller = TaskPageController<AdminApi>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dataco_dashboard=info,dataco_client=info,dataco_events=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::from_env()?;
    if let Some(variant) = cli.variant.clone() {
        config.variant = variant;
    }
    let store = SessionStore::new(config.session_path.clone());

    match cli.command {
        Commands::Session(cmd) => Ok(run_session(cmd, &store)?),
        Commands::Projects => {
            let api = config.connect(&store)?;
            let projects = api
                .list_projects()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else {
                for project in projects {
                    println!("{}  {}", project.id, project.name);
                }
            }
            Ok(())
        }
        Commands::Show { task_id } => {
            let page = open_page(&config, &store, task_id).await?;
            print_page(&page.state(), cli.json)
        }
        Commands::Watch { task_id } => watch(&config, &store, task_id, cli.json).await,
        Commands::Task(cmd) => run_task(cmd, &config, &store).await,
        Commands::Subtask(cmd) => run_subtask(cmd, &config, &store).await,
        Commands::BugReport {
            title,
            description,
            severity,
            page,
        } => {
            let api = config.connect(&store)?;
            let report = BugReport {
                title,
                description,
                severity,
                page,
            };
            finish(submit_bug_report(&api, report, &LogNotifier, &config.variant).await)
        }
    }
}

/// Build a controller and do the initial forced load.
async fn open_page(
    config: &DashboardConfig,
    store: &SessionStore,
    task_id: String,
) -> anyhow::Result<Arc<Controller>> {
    let api = config.connect(store)?;
    let controller = Arc::new(Controller::new(
        Arc::new(api),
        task_id,
        config.variant.clone(),
        Arc::new(LogNotifier),
    ));

    match controller.force_refresh().await {
        FetchOutcome::Applied => Ok(controller),
        FetchOutcome::LoginRequired => bail!("Session expired. Log in again"),
        _ => {
            let state = controller.state();
            bail!(state.error.unwrap_or_else(|| "Failed to load task".into()))
        }
    }
}

fn finish(outcome: MutationOutcome) -> anyhow::Result<()> {
    match outcome {
        MutationOutcome::Completed => Ok(()),
        MutationOutcome::NavigateToTaskList => {
            println!("Task deleted. Return to the task list.");
            Ok(())
        }
        MutationOutcome::Invalid(message) | MutationOutcome::Failed(message) => bail!(message),
        MutationOutcome::Busy => bail!("Another change is still being saved"),
        MutationOutcome::LoginRequired => bail!("Session expired. Log in again"),
    }
}

async fn watch(
    config: &DashboardConfig,
    store: &SessionStore,
    task_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let api = config.connect(store)?;
    let controller = Arc::new(Controller::new(
        Arc::new(api),
        task_id,
        config.variant.clone(),
        Arc::new(LogNotifier),
    ));
    let cancel = CancellationToken::new();

    let mut triggers = Triggers {
        poll_period: config.poll_interval,
        ..Default::default()
    };

    match (&config.realtime_ws_url, config.variant.realtime) {
        (Some(url), true) => {
            let hub = Arc::new(RealtimeHub::default());
            triggers.realtime = Some(hub.subscribe());
            let subscription = RealtimeSubscription::new(url.clone(), hub);
            let cancel = cancel.clone();
            tokio::spawn(async move { subscription.run(cancel).await });
        }
        (None, true) => tracing::info!("REALTIME_WS_URL not set, relying on polling"),
        _ => {}
    }

    let (refresh_tx, refresh_rx) = mpsc::channel(8);
    triggers.manual = Some(refresh_rx);
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            if refresh_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    let mut changes = controller.changes();
    let printer = controller.clone();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let state = printer.state();
            if state.interaction.is_user_interacting() {
                continue;
            }
            if let Err(e) = print_page(&state, json) {
                tracing::warn!(error = %e, "Failed to print page");
            }
        }
    });

    let page = tokio::spawn(run_page(controller, triggers, cancel.clone()));

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    cancel.cancel();
    page.await.context("Page task panicked")?;
    Ok(())
}

async fn run_task(cmd: TaskCommands, config: &DashboardConfig, store: &SessionStore) -> anyhow::Result<()> {
    match cmd {
        TaskCommands::Create { project, fields } => {
            let api = config.connect(store)?;
            let mut form = TaskForm::for_project(project);
            apply_task_fields(&mut form, fields)?;
            finish(create_task(&api, form, &LogNotifier, &config.variant).await)
        }
        TaskCommands::Edit { task_id, fields } => {
            let page = open_page(config, store, task_id).await?;
            let task = page.state().task.context("Task is not loaded")?;
            let mut form = TaskForm::from_task(&task);
            apply_task_fields(&mut form, fields)?;
            page.open_edit(EntityRef::Task(task.id));
            finish(page.update_task(form).await)
        }
        TaskCommands::Visibility { task_id } => {
            let page = open_page(config, store, task_id).await?;
            finish(page.toggle_task_visibility().await)
        }
        TaskCommands::Delete { task_id, yes } => {
            if !yes {
                bail!("Deleting a task removes all of its subtasks. Pass --yes to confirm");
            }
            let page = open_page(config, store, task_id.clone()).await?;
            page.request_delete(EntityRef::Task(task_id));
            finish(page.delete_task().await)
        }
    }
}

async fn run_subtask(
    cmd: SubtaskCommands,
    config: &DashboardConfig,
    store: &SessionStore,
) -> anyhow::Result<()> {
    match cmd {
        SubtaskCommands::Add { task_id, fields } => {
            let page = open_page(config, store, task_id).await?;
            let task = page.state().task.context("Task is not loaded")?;
            let mut form = NewSubtask::for_task(&task);
            apply_new_subtask_fields(&mut form, fields);
            page.open_create_form();
            finish(page.create_subtask(form).await)
        }
        SubtaskCommands::Edit {
            task_id,
            subtask_id,
            fields,
        } => {
            let page = open_page(config, store, task_id).await?;
            let subtask = page
                .state()
                .subtask(&subtask_id)
                .cloned()
                .with_context(|| format!("Subtask {subtask_id} does not belong to this task"))?;
            let mut form = SubtaskUpdate::from_subtask(&subtask);
            apply_subtask_update_fields(&mut form, fields);
            page.open_edit(EntityRef::Subtask(subtask_id.clone()));
            finish(page.update_subtask(&subtask_id, form).await)
        }
        SubtaskCommands::Visibility { task_id, subtask_id } => {
            let page = open_page(config, store, task_id).await?;
            finish(page.toggle_subtask_visibility(&subtask_id).await)
        }
        SubtaskCommands::Delete {
            task_id,
            subtask_id,
            yes,
        } => {
            if !yes {
                bail!("Pass --yes to confirm deleting subtask {subtask_id}");
            }
            let page = open_page(config, store, task_id).await?;
            page.request_delete(EntityRef::Subtask(subtask_id.clone()));
            finish(page.delete_subtask(&subtask_id).await)
        }
    }
}

fn run_session(cmd: SessionCommands, store: &SessionStore) -> Result<(), DashboardError> {
    match cmd {
        SessionCommands::Login {
            token,
            user_id,
            username,
        } => {
            // clap only lets the two user flags through together.
            match user_id.zip(username) {
                Some((id, username)) => {
                    let user = AdminUser {
                        id,
                        username,
                        role: None,
                    };
                    store.save_login(&token, &user)?;
                }
                None => {
                    store.set(TOKEN_KEY, &token)?;
                    store.remove(USER_KEY)?;
                }
            }
            println!("Session saved to {}", store.path().display());
            Ok(())
        }
        SessionCommands::Logout => {
            store.logout()?;
            println!("Logged out");
            Ok(())
        }
        SessionCommands::Status => {
            let auth = AuthContext::load(store);
            match (auth.is_authenticated(), auth.user()) {
                (true, Some(user)) => println!("Logged in as {} ({})", user.username, user.id),
                (true, None) => println!("Token present, no user record"),
                (false, _) => println!("Not logged in"),
            }
            Ok(())
        }
    }
}

// ---- field application ----

fn apply_task_fields(form: &mut TaskForm, fields: TaskFields) -> anyhow::Result<()> {
    if let Some(title) = fields.title {
        form.title = title;
    }
    if let Some(subtitle) = fields.subtitle {
        form.subtitle = Some(subtitle);
    }
    if let Some(dataco) = fields.dataco {
        form.set_dataco_input(&dataco);
    }
    if let Some(amount) = fields.amount {
        form.amount_needed = amount;
    }
    if !fields.task_types.is_empty() {
        form.task_types = fields.task_types;
    }
    if !fields.locations.is_empty() {
        form.locations = fields.locations;
    }
    if !fields.target_car.is_empty() {
        form.target_car = fields.target_car;
    }
    if !fields.day_time.is_empty() {
        form.day_time = fields.day_time;
    }
    if let Some(priority) = fields.priority {
        form.priority = Priority::new(priority)?;
    }
    if let Some(lidar) = fields.lidar {
        form.lidar = lidar;
    }
    Ok(())
}

fn apply_new_subtask_fields(form: &mut NewSubtask, fields: SubtaskFields) {
    if let Some(title) = fields.title {
        form.title = title;
    }
    form.subtitle = fields.subtitle;
    if let Some(dataco) = fields.dataco {
        form.set_dataco_input(&dataco);
    }
    if let Some(subtask_type) = fields.subtask_type {
        form.subtask_type = subtask_type;
    }
    if let Some(amount) = fields.amount {
        form.amount_needed = amount;
    }
    form.labels = fields.labels;
    if let Some(weather) = fields.weather {
        form.weather = weather;
    }
    if let Some(scene) = fields.scene {
        form.scene = scene;
    }
    form.day_time = fields.day_time;
}

fn apply_subtask_update_fields(form: &mut SubtaskUpdate, fields: SubtaskFields) {
    if let Some(title) = fields.title {
        form.title = title;
    }
    if let Some(subtitle) = fields.subtitle {
        form.subtitle = Some(subtitle);
    }
    if let Some(dataco) = fields.dataco {
        form.set_dataco_input(&dataco);
    }
    if let Some(subtask_type) = fields.subtask_type {
        form.subtask_type = subtask_type;
    }
    if let Some(amount) = fields.amount {
        form.amount_needed = amount;
    }
    if !fields.labels.is_empty() {
        form.labels = fields.labels;
    }
    if let Some(weather) = fields.weather {
        form.weather = weather;
    }
    if let Some(scene) = fields.scene {
        form.scene = scene;
    }
    if !fields.day_time.is_empty() {
        form.day_time = fields.day_time;
    }
}

// ---- output ----

fn print_page(state: &PageState, json: bool) -> anyhow::Result<()> {
    if json {
        let view = serde_json::json!({
            "task": state.task,
            "project": state.project,
            "subtasks": state.subtasks,
            "error": state.error,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if let Some(error) = &state.error {
        println!("! {error}");
    }
    let Some(task) = &state.task else {
        if state.task_deleted {
            println!("Task was deleted.");
        }
        return Ok(());
    };

    let project = state.project.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
    let visibility = if task.is_visible { "visible" } else { "hidden" };
    println!("{}  {}  [{project}] ({visibility})", task.display_dataco(), task.title);
    println!(
        "  priority: {}  amount needed: {}  subtasks total: {}",
        task.priority.label(),
        task.amount_needed,
        state.subtask_amount_total(),
    );
    if !task.target_car.is_empty() {
        println!("  target cars: {}", task.target_car.join(", "));
    }
    for subtask in &state.subtasks {
        let marker = if subtask.is_visible() { " " } else { "~" };
        println!(
            "  {marker} {}  {:<30} {:>6} {:<6} {}/{}",
            subtask.id,
            subtask.title,
            subtask.amount_needed,
            subtask.subtask_type,
            subtask.weather,
            subtask.scene,
        );
    }
    Ok(())
}
