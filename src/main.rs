use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cmd;

#[derive(Parser)]
#[command(name = "tasker")]
#[command(version, about = "Kanban task board client")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to confirmation prompts
    #[arg(long, global = true)]
    pub yes: bool,

    /// Path to tasker.toml. Searched in ./.tasker and the user config dir if omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Task API base URL. Overrides TASKER_API_URL and tasker.toml.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Bearer token. Overrides TASKER_TOKEN and tasker.toml.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List projects
    Projects {
        /// Include archived projects
        #[arg(long)]
        archived: bool,
    },
    /// Show a project's board
    Board {
        #[arg(short, long)]
        project: Option<i64>,
        /// Only tasks assigned to this person id
        #[arg(long)]
        assignee: Option<i64>,
        /// Only tasks with this severity (1-5)
        #[arg(long)]
        severity: Option<u8>,
        /// Only tasks with this status (e.g. NOT_STARTED, testing)
        #[arg(long)]
        status: Option<String>,
    },
    /// Create a task in the To Do column
    Create {
        name: String,
        #[arg(short, long)]
        project: Option<i64>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        severity: Option<u8>,
        #[arg(long)]
        priority: Option<u8>,
    },
    /// Move a task to another column and wait for the server to settle it
    Move { task_id: i64, status: String },
    /// Show a task with its comments and attachments
    Show { task_id: i64 },
    /// Comment on a task
    Comment { task_id: i64, text: String },
    /// Attach a file to a task
    Attach { task_id: i64, path: PathBuf },
    /// Delete a task
    Delete { task_id: i64 },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default tasker.toml file
    Init,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tasker=debug" } else { "tasker=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let work_dir = std::env::current_dir().context("Failed to get current directory")?;

    let config = || cmd::load_config(&cli, &work_dir);
    match &cli.command {
        Commands::Projects { archived } => cmd::cmd_projects(&config()?, *archived).await?,
        Commands::Board {
            project,
            assignee,
            severity,
            status,
        } => {
            let filter = cmd::parse_filter(*assignee, *severity, status.as_deref())?;
            cmd::cmd_board(&config()?, *project, filter).await?
        }
        Commands::Create {
            name,
            project,
            description,
            severity,
            priority,
        } => {
            let new_task = cmd::NewTaskArgs {
                name: name.clone(),
                description: description.clone(),
                severity: *severity,
                priority: *priority,
            };
            cmd::cmd_create(&config()?, *project, new_task).await?
        }
        Commands::Move { task_id, status } => cmd::cmd_move(&config()?, *task_id, status).await?,
        Commands::Show { task_id } => cmd::cmd_show(&config()?, *task_id).await?,
        Commands::Comment { task_id, text } => {
            cmd::cmd_comment(&config()?, *task_id, text).await?
        }
        Commands::Attach { task_id, path } => cmd::cmd_attach(&config()?, *task_id, path).await?,
        Commands::Delete { task_id } => cmd::cmd_delete(&config()?, *task_id, cli.yes).await?,
        Commands::Config { command } => cmd::cmd_config(&cli, &work_dir, command.clone())?,
    }

    Ok(())
}
