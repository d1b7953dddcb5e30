//! Task detail commands: `tasker show|comment|attach|delete`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::Path;
use std::sync::Arc;

use tasker::board::{AttachmentUpload, TaskApi, TaskDetail};
use tasker::config::TaskerConfig;
use tasker::ui::icons::{ATTACHMENT, CHECK, COMMENT};
use tasker::ui::render_detail;

use super::{board_for_task, connect};

pub async fn cmd_show(config: &TaskerConfig, task_id: i64) -> Result<()> {
    let http = connect(config)?;
    let api: Arc<dyn TaskApi> = http.clone();
    let detail = TaskDetail::open(api, task_id)
        .await
        .with_context(|| format!("Failed to load task #{}", task_id))?;
    print!(
        "{}",
        render_detail(detail.task(), detail.comments(), |id| {
            http.attachment_download_url(id)
        })
    );
    Ok(())
}

pub async fn cmd_comment(config: &TaskerConfig, task_id: i64, text: &str) -> Result<()> {
    let api = connect(config)?;
    let mut detail = TaskDetail::open(api, task_id)
        .await
        .with_context(|| format!("Failed to load task #{}", task_id))?;
    let comment = detail.add_comment(text).await?;
    println!(
        "{}Comment {} added to #{}",
        COMMENT,
        style(comment.comment_id).bold(),
        task_id
    );
    Ok(())
}

pub async fn cmd_attach(config: &TaskerConfig, task_id: i64, path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let api = connect(config)?;
    let (mut board, _) = board_for_task(config, api, task_id).await?;
    let mut detail = board.open_detail(task_id)?;
    let upload = AttachmentUpload {
        file_name: file_name.clone(),
        content_type: content_type.clone(),
        bytes,
    };
    let attachment_id = detail.upload_attachment(upload, board.cache_mut()).await?;
    println!(
        "{}Attached {} ({}) to #{} as {}",
        ATTACHMENT,
        file_name,
        content_type,
        task_id,
        style(attachment_id).bold()
    );
    Ok(())
}

pub async fn cmd_delete(config: &TaskerConfig, task_id: i64, yes: bool) -> Result<()> {
    use dialoguer::Confirm;

    let api = connect(config)?;
    let (mut board, task) = board_for_task(config, api, task_id).await?;

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!("Delete task #{} \"{}\"?", task_id, task.name))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("Delete cancelled");
            return Ok(());
        }
    }

    let detail = board.open_detail(task_id)?;
    detail.delete(board.cache_mut()).await?;
    if board.cache().get(task_id).is_some() {
        bail!("Task #{} is still on the board", task_id);
    }
    println!("{}Deleted task #{}", CHECK, task_id);
    Ok(())
}
