//! Board commands: `tasker projects|board|create|move`.

use anyhow::{Context, Result, anyhow, bail};
use console::style;

use tasker::board::models::{Filter, Level, NewTask, TaskStatus};
use tasker::board::{KanbanBoard, TaskApi};
use tasker::config::TaskerConfig;
use tasker::ui::icons::{MOVE, SPARKLE};
use tasker::ui::{SyncUI, render_board, render_projects};

use super::{board_for_task, connect, resolve_project};

pub async fn cmd_projects(config: &TaskerConfig, archived: bool) -> Result<()> {
    let api = connect(config)?;
    let projects = api
        .list_projects(archived)
        .await
        .context("Failed to list projects")?;
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    print!("{}", render_projects(&projects));
    Ok(())
}

pub async fn cmd_board(config: &TaskerConfig, project: Option<i64>, filter: Filter) -> Result<()> {
    let project_id = resolve_project(config, project)?;
    let api = connect(config)?;
    let mut board = KanbanBoard::new(api, config.activation_distance());

    let ui = SyncUI::new(format!("Loading project {}", project_id));
    board.select_project(project_id);
    if !filter.is_empty() {
        board.set_filter(filter)?;
    }
    board.settle().await;
    ui.clear();

    if let Some(err) = board.last_load_error() {
        bail!("Failed to load project {}: {}", project_id, err);
    }

    println!();
    print!("{}", render_board(&board.columns(), board.members()));
    Ok(())
}

/// Optional fields for `tasker create`.
#[derive(Debug, Clone)]
pub struct NewTaskArgs {
    pub name: String,
    pub description: Option<String>,
    pub severity: Option<u8>,
    pub priority: Option<u8>,
}

fn level(field: &str, value: Option<u8>) -> Result<Level> {
    match value {
        Some(v) => Level::try_from(v).map_err(|e| anyhow!("Invalid {}: {}", field, e)),
        None => Ok(Level::default()),
    }
}

pub async fn cmd_create(
    config: &TaskerConfig,
    project: Option<i64>,
    args: NewTaskArgs,
) -> Result<()> {
    let project_id = resolve_project(config, project)?;
    let mut new_task = NewTask::named(project_id, args.name);
    new_task.description = args.description;
    new_task.severity = level("severity", args.severity)?;
    new_task.priority = level("priority", args.priority)?;

    let api = connect(config)?;
    let mut board = KanbanBoard::new(api, config.activation_distance());
    board.set_project(project_id);
    let task = board.create(new_task).await?;
    println!(
        "{}Created task {} in {}",
        SPARKLE,
        style(format!("#{}", task.task_id)).bold(),
        task.status.title()
    );
    Ok(())
}

pub async fn cmd_move(config: &TaskerConfig, task_id: i64, status: &str) -> Result<()> {
    let target: TaskStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    let api = connect(config)?;
    let (mut board, _) = board_for_task(config, api, task_id).await?;

    if !board.move_task(task_id, target)? {
        println!("Task #{} is already in {}", task_id, target.title());
        return Ok(());
    }

    let ui = SyncUI::new(format!("Moving #{} to {}", task_id, target.title()));
    board.settle().await;

    let settled = board
        .cache()
        .status_of(task_id)
        .ok_or_else(|| anyhow!("Task #{} disappeared from the board", task_id))?;
    match board.last_rejection() {
        Some((id, err)) if *id == task_id => {
            ui.finish_err(format!("Move rejected: {}", err));
            bail!("Task #{} stays in {}", task_id, settled.title());
        }
        _ => ui.finish_ok(format!("{}#{} is in {}", MOVE, task_id, settled.title())),
    }
    Ok(())
}
