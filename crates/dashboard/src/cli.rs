use clap::{Args, Parser, Subcommand};
use dataco_core::bug_report::Severity;
use dataco_core::tags::{DayTime, Scene, SubtaskType, TaskType, Weather};
use dataco_dashboard::PageVariant;

#[derive(Parser)]
#[command(
    name = "dataco-admin",
    version,
    about = "DATACO admin dashboard: inspect and edit tasks and subtasks",
    after_help = "\
CONFIGURATION:
  Read from the environment (and .env): API_BASE_URL, SESSION_PATH,
  REALTIME_WS_URL, POLL_INTERVAL_SECS, REQUEST_TIMEOUT_SECS, PAGE_VARIANT.
  Run `dataco-admin session login` before any API command.

DELETION:
  Deleting a task or subtask needs --yes as confirmation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Page variant (classic, realtime, loops); overrides PAGE_VARIANT
    #[arg(long, global = true)]
    pub variant: Option<PageVariant>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a task page once and print it
    Show {
        task_id: String,
    },

    /// Keep a task page open, printing it whenever it changes.
    /// Press Enter to force a refresh, Ctrl-C to quit.
    Watch {
        task_id: String,
    },

    /// List projects
    Projects,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Subtask management
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// File a bug report
    BugReport {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long, default_value = "medium")]
        severity: Severity,

        /// Page the problem was seen on
        #[arg(long)]
        page: Option<String>,
    },

    /// Stored credentials
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task under an existing project
    Create {
        #[arg(long)]
        project: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Update a task. Unset fields keep their current values.
    Edit {
        task_id: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Flip a task's visibility
    Visibility {
        task_id: String,
    },

    /// Delete a task and, server-side, its subtasks
    Delete {
        task_id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct TaskFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub subtitle: Option<String>,

    /// DATACO number; non-digits are stripped
    #[arg(long)]
    pub dataco: Option<String>,

    #[arg(long)]
    pub amount: Option<i64>,

    /// Repeatable
    #[arg(long = "type")]
    pub task_types: Vec<TaskType>,

    /// Repeatable
    #[arg(long = "location")]
    pub locations: Vec<String>,

    /// Repeatable
    #[arg(long = "target-car")]
    pub target_car: Vec<String>,

    #[arg(long = "day-time")]
    pub day_time: Vec<DayTime>,

    /// 1 (highest) to 10 (lowest), 0 for none
    #[arg(long)]
    pub priority: Option<u8>,

    #[arg(long)]
    pub lidar: Option<bool>,
}

#[derive(Subcommand)]
pub enum SubtaskCommands {
    /// Add a subtask; it inherits the task's target cars
    Add {
        task_id: String,

        #[command(flatten)]
        fields: SubtaskFields,
    },

    /// Update a subtask. Unset fields keep their current values.
    Edit {
        task_id: String,
        subtask_id: String,

        #[command(flatten)]
        fields: SubtaskFields,
    },

    /// Flip a subtask's visibility
    Visibility {
        task_id: String,
        subtask_id: String,
    },

    Delete {
        task_id: String,
        subtask_id: String,

        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
pub struct SubtaskFields {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub subtitle: Option<String>,

    /// DATACO number; non-digits are stripped
    #[arg(long)]
    pub dataco: Option<String>,

    #[arg(long = "type")]
    pub subtask_type: Option<SubtaskType>,

    #[arg(long)]
    pub amount: Option<i64>,

    /// Repeatable
    #[arg(long = "label")]
    pub labels: Vec<String>,

    #[arg(long)]
    pub weather: Option<Weather>,

    #[arg(long)]
    pub scene: Option<Scene>,

    #[arg(long = "day-time")]
    pub day_time: Vec<DayTime>,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Store a token (and optionally the user it belongs to)
    Login {
        #[arg(long)]
        token: String,

        #[arg(long, requires = "username")]
        user_id: Option<String>,

        #[arg(long, requires = "user_id")]
        username: Option<String>,
    },

    /// Forget the stored token and user
    Logout,

    /// Show who is logged in
    Status,
}
