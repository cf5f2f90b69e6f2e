use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::io::logging::{LOG_RETENTION_DAYS, LogLevel};

#[derive(Parser)]
#[command(name = "acgen", about = concat!("acgen v", env!("CARGO_PKG_VERSION"), " - Jira acceptance criteria into Playwright scaffolding"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Console log verbosity (RUST_LOG takes precedence)
    #[arg(short = 'l', long, value_enum, global = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Also write a per-run log file into this directory
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Delete run logs older than this many days
    #[arg(long, global = true, default_value_t = LOG_RETENTION_DAYS)]
    pub log_retention_days: i64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch issues and merge their acceptance criteria into a test file
    Sync(SyncArgs),
    /// Show the generated blocks, imports and marker found in a test file
    Scan(ScanArgs),
    /// List the available profiles
    Profiles(ProfilesArgs),
    /// Print rendered blocks for issues without touching any file
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Sync args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SyncArgs {
    /// Playwright test file to update
    #[arg(short = 'f', long, default_value = "tests/crm.spec.ts")]
    pub file: PathBuf,

    /// Application profile used to render blocks
    #[arg(long, default_value = "CRM")]
    pub profile: String,

    /// TOML file with additional or overriding profiles
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// Jira project key(s) to fetch issues from
    #[arg(short = 'p', long = "project", num_args = 1..)]
    pub projects: Vec<String>,

    /// Jira board id(s) to fetch issues from
    #[arg(short = 'b', long = "board", num_args = 1..)]
    pub boards: Vec<String>,

    /// Compute the merge but do not write the file
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Insert blocks even when identical text is already present
    #[arg(long, alias = "dup")]
    pub allow_duplicates: bool,

    /// Read issues from a JSON file instead of Jira
    #[arg(long)]
    pub issues: Option<PathBuf>,

    #[command(flatten)]
    pub jira: JiraArgs,
}

#[derive(Args)]
pub struct JiraArgs {
    /// Jira base URL
    #[arg(long = "jira-url", env = "JIRA_BASE_URL")]
    pub url: Option<String>,

    /// Jira user name
    #[arg(long = "jira-user", env = "JIRA_USERNAME")]
    pub user: Option<String>,

    /// Jira API token
    #[arg(long = "jira-token", env = "JIRA_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,
}

// ---------------------------------------------------------------------------
// Scan args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ScanArgs {
    /// Test file to inspect
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Profiles args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProfilesArgs {
    /// TOML file with additional or overriding profiles
    #[arg(long)]
    pub profiles: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Render args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RenderArgs {
    /// Application profile used to render blocks
    #[arg(long, default_value = "CRM")]
    pub profile: String,

    /// TOML file with additional or overriding profiles
    #[arg(long)]
    pub profiles: Option<PathBuf>,

    /// JSON file with the issues to render
    #[arg(long)]
    pub issues: PathBuf,
}
