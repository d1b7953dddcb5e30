//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled                                 |
//! |----------|--------------------------------------------------|
//! | `board`  | `Projects`, `Board`, `Create`, `Move`            |
//! | `task`   | `Show`, `Comment`, `Attach`, `Delete`            |
//! | `config` | `Config`                                         |

pub mod board;
pub mod config;
pub mod task;

pub use board::{NewTaskArgs, cmd_board, cmd_create, cmd_move, cmd_projects};
pub use config::cmd_config;
pub use task::{cmd_attach, cmd_comment, cmd_delete, cmd_show};

use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;

use tasker::board::models::{Filter, Level, TaskStatus};
use tasker::board::{HttpTaskApi, KanbanBoard, Task, TaskApi};
use tasker::config::{CliOverrides, TaskerConfig};
use tasker::ui::SyncUI;

use crate::Cli;

pub fn load_config(cli: &Cli, work_dir: &Path) -> Result<TaskerConfig> {
    let config = TaskerConfig::load(cli.config.as_deref(), work_dir)?.with_cli_args(CliOverrides {
        api_url: cli.api_url.clone(),
        token: cli.token.clone(),
    });
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }
    Ok(config)
}

pub fn connect(config: &TaskerConfig) -> Result<Arc<HttpTaskApi>> {
    let api = HttpTaskApi::new(&config.base_url(), config.token(), config.timeout())
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(api))
}

pub fn parse_filter(
    assignee: Option<i64>,
    severity: Option<u8>,
    status: Option<&str>,
) -> Result<Filter> {
    let severity = severity
        .map(Level::try_from)
        .transpose()
        .map_err(|e| anyhow!("Invalid severity: {}", e))?;
    let status = status
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(|e| anyhow!(e))?;
    Ok(Filter {
        status,
        assignee_id: assignee,
        severity,
    })
}

/// `--project`, else the configured default.
pub fn resolve_project(config: &TaskerConfig, project: Option<i64>) -> Result<i64> {
    project.or_else(|| config.default_project()).ok_or_else(|| {
        anyhow!("No project given. Pass --project, set TASKER_PROJECT, or set board.default_project")
    })
}

/// Load the board of the project that owns `task_id`.
pub async fn board_for_task(
    config: &TaskerConfig,
    api: Arc<dyn TaskApi>,
    task_id: i64,
) -> Result<(KanbanBoard, Task)> {
    let ui = SyncUI::new(format!("Loading task #{}", task_id));
    let task = api
        .get_task(task_id)
        .await
        .with_context(|| format!("Failed to load task #{}", task_id))?;
    let mut board = KanbanBoard::new(api, config.activation_distance());
    board.select_project(task.project_id);
    board.settle().await;
    ui.clear();
    if let Some(err) = board.last_load_error() {
        return Err(anyhow!("Failed to load project {}: {}", task.project_id, err));
    }
    Ok((board, task))
}
