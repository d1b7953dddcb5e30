//! Task Detail Session: one open task's editable fields, comments and
//! attachments.
//!
//! Nothing here is optimistic. The cache is written only after the server
//! confirms, so a failed save or delete leaves it exactly as it was.

use std::sync::Arc;

use super::api::{AttachmentUpload, TaskApi};
use super::cache::TaskCache;
use super::models::{Comment, Level, Task, TaskStatus, TaskUpdate};
use crate::errors::BoardError;

/// Editable copy of the user-facing task fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub assignee_id: Option<i64>,
    pub status: TaskStatus,
    pub severity: u8,
    pub priority: u8,
    /// Comma-separated, as typed.
    pub tags: String,
}

impl TaskDraft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone().unwrap_or_default(),
            assignee_id: task.assignee_id,
            status: task.status,
            severity: task.severity.get(),
            priority: task.priority.get(),
            tags: task.tags.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }

    /// Split the tag field on `,`, trimming and dropping empties.
    pub fn tag_list(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }

    /// Check the draft and turn it into an update body.
    pub fn to_update(&self) -> Result<TaskUpdate, BoardError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BoardError::InvalidField {
                field: "name",
                value: self.name.clone(),
            });
        }
        let severity = Level::new(self.severity).ok_or(BoardError::InvalidField {
            field: "severity",
            value: self.severity.to_string(),
        })?;
        let priority = Level::new(self.priority).ok_or(BoardError::InvalidField {
            field: "priority",
            value: self.priority.to_string(),
        })?;

        Ok(TaskUpdate {
            name: Some(name.to_string()),
            description: Some(self.description.clone()),
            // 0 tells the server to unassign.
            assignee_id: Some(self.assignee_id.unwrap_or(0)),
            status: Some(self.status),
            severity: Some(severity),
            priority: Some(priority),
            tags: Some(self.tag_list()),
            ..TaskUpdate::default()
        })
    }
}

pub struct TaskDetail {
    api: Arc<dyn TaskApi>,
    task: Task,
    comments: Vec<Comment>,
    draft: Option<TaskDraft>,
}

impl TaskDetail {
    pub fn new(api: Arc<dyn TaskApi>, task: Task) -> Self {
        Self {
            api,
            task,
            comments: Vec::new(),
            draft: None,
        }
    }

    /// Fetch a task by id and its comments.
    pub async fn open(api: Arc<dyn TaskApi>, task_id: i64) -> Result<Self, BoardError> {
        let task = api.get_task(task_id).await?;
        let mut detail = Self::new(api, task);
        detail.load_comments().await?;
        Ok(detail)
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn draft(&self) -> Option<&TaskDraft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub async fn load_comments(&mut self) -> Result<(), BoardError> {
        self.comments = self.api.list_comments(self.task.task_id).await?;
        Ok(())
    }

    /// Seed a draft from the task, replacing any draft in progress.
    pub fn start_editing(&mut self) -> &mut TaskDraft {
        self.draft.insert(TaskDraft::from_task(&self.task))
    }

    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        self.draft.as_mut()
    }

    pub fn cancel_editing(&mut self) {
        self.draft = None;
    }

    /// Send the draft and replace the cached task with the server's copy.
    /// A task outside the current view is not added to the cache.
    ///
    /// The draft is kept when validation or the request fails.
    pub async fn save(&mut self, cache: &mut TaskCache) -> Result<&Task, BoardError> {
        let task_id = self.task.task_id;
        let update = match self.draft {
            Some(ref draft) => draft.to_update()?,
            None => return Ok(&self.task),
        };
        let updated = self.api.update_task(task_id, &update).await?;
        tracing::info!(task_id, "task saved");
        cache.refresh(updated.clone());
        self.task = updated;
        self.draft = None;
        Ok(&self.task)
    }

    /// Delete the task, then drop it from the cache.
    pub async fn delete(self, cache: &mut TaskCache) -> Result<(), BoardError> {
        let task_id = self.task.task_id;
        self.api.delete_task(task_id).await?;
        tracing::info!(task_id, "task deleted");
        cache.remove(task_id);
        Ok(())
    }

    /// Post a comment. It is listed only once the server has accepted it.
    pub async fn add_comment(&mut self, text: &str) -> Result<&Comment, BoardError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BoardError::InvalidField {
                field: "comment",
                value: text.to_string(),
            });
        }
        let comment = self.api.create_comment(self.task.task_id, text).await?;
        self.comments.push(comment);
        self.comments
            .last()
            .ok_or(BoardError::TaskNotFound { id: self.task.task_id })
    }

    pub async fn edit_comment(&mut self, comment_id: i64, text: &str) -> Result<(), BoardError> {
        let updated = self.api.update_comment(comment_id, text.trim()).await?;
        if let Some(comment) = self.comments.iter_mut().find(|c| c.comment_id == comment_id) {
            *comment = updated;
        }
        Ok(())
    }

    pub async fn delete_comment(&mut self, comment_id: i64) -> Result<(), BoardError> {
        self.api.delete_comment(comment_id).await?;
        self.comments.retain(|c| c.comment_id != comment_id);
        Ok(())
    }

    /// Upload a file, then refresh the task so its attachment list is current.
    pub async fn upload_attachment(
        &mut self,
        upload: AttachmentUpload,
        cache: &mut TaskCache,
    ) -> Result<i64, BoardError> {
        let task_id = self.task.task_id;
        let file_name = upload.file_name.clone();
        let attachment_id = self.api.upload_task_attachment(task_id, upload).await?;
        tracing::info!(task_id, attachment_id, file_name = %file_name, "attachment uploaded");
        self.refresh(cache).await?;
        Ok(attachment_id)
    }

    pub async fn delete_attachment(
        &mut self,
        attachment_id: i64,
        cache: &mut TaskCache,
    ) -> Result<(), BoardError> {
        self.api.delete_task_attachment(attachment_id).await?;
        self.task
            .attachments
            .retain(|a| a.attachment_id != attachment_id);
        cache.refresh(self.task.clone());
        Ok(())
    }

    async fn refresh(&mut self, cache: &mut TaskCache) -> Result<(), BoardError> {
        let task = self.api.get_task(self.task.task_id).await?;
        cache.refresh(task.clone());
        self.task = task;
        Ok(())
    }
}
