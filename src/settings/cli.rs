use super::Parser;
use clap::{Args, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taskdeck", about = "Command-line client for the Smart Task backend")]
pub struct Cli {
    #[arg(long, global = true)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show whether the stored session is still valid.
    Status,
    /// Exchange the stored refresh token for a new access token.
    Refresh,
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },
    #[command(subcommand)]
    Tasks(TasksCommand),
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// One page of tasks.
    List(FilterArgs),
    /// Every matching task, unpaginated.
    All(FilterArgs),
    Get {
        id: i64,
    },
    Create(DraftArgs),
    /// Replace every field of a task.
    Update {
        id: i64,
        #[command(flatten)]
        draft: DraftArgs,
    },
    /// Change only the given fields.
    Patch {
        id: i64,
        #[command(flatten)]
        patch: PatchArgs,
    },
    Delete {
        id: i64,
    },
    Analytics,
    Insights,
    Reminders,
    /// Analytics, insights and reminders fetched together.
    Dashboard,
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub important: Option<bool>,
    #[arg(long)]
    pub search: Option<String>,
    /// due_date, -due_date, created_at or -created_at
    #[arg(long)]
    pub ordering: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// YYYY-MM-DD
    #[arg(long)]
    pub due_date: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub important: bool,
    #[arg(long, default_value = "")]
    pub category: String,
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub due_date: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub important: Option<bool>,
    #[arg(long)]
    pub category: Option<String>,
}
