//! In-memory [`TaskApi`] used by the board's unit tests.
//!
//! Behaves like the real server over a task list, and can hold selected
//! operations until the test releases them, so completions can be delivered
//! in any order.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::api::{AttachmentUpload, TaskApi};
use super::models::*;
use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListProjects,
    GetProject,
    ListTasks,
    GetTask,
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListComments,
    CreateComment,
    UpdateComment,
    DeleteComment,
    UploadAttachment,
    DeleteAttachment,
}

struct Held {
    op: Op,
    tx: oneshot::Sender<Option<ApiError>>,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    members: Vec<ProjectMember>,
    next_id: i64,
    calls: Vec<Op>,
    updates: Vec<(i64, TaskUpdate)>,
    holding: HashSet<Op>,
    held: Vec<Held>,
    failures: Vec<(Op, ApiError)>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn with_tasks(tasks: Vec<Task>) -> Arc<Self> {
        let next_id = tasks.iter().map(|t| t.task_id).max().unwrap_or(0) + 1;
        Arc::new(Self {
            state: Mutex::new(State {
                tasks,
                next_id: next_id.max(100),
                ..State::default()
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_member(&self, person_id: i64, name: &str) {
        self.lock().members.push(ProjectMember {
            person: PersonBrief {
                person_id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                nickname: None,
            },
            role: ProjectRole::Member,
        });
    }

    /// Hold every later call of `op` until [`Self::release`].
    pub fn hold(&self, op: Op) {
        self.lock().holding.insert(op);
    }

    /// Stop holding later calls of `op`. Calls already parked stay parked.
    pub fn resume(&self, op: Op) {
        self.lock().holding.remove(&op);
    }

    /// Make the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: Op, err: ApiError) {
        self.lock().failures.push((op, err));
    }

    pub fn held_count(&self, op: Op) -> usize {
        self.lock().held.iter().filter(|h| h.op == op).count()
    }

    /// Yield until `n` calls of `op` are parked.
    pub async fn wait_held(&self, op: Op, n: usize) {
        for _ in 0..10_000 {
            if self.held_count(op) >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("timed out waiting for {} held {:?} calls", n, op);
    }

    /// Let the `index`-th parked call of `op` proceed, or fail it with `err`.
    pub fn release(&self, op: Op, index: usize, err: Option<ApiError>) {
        let mut state = self.lock();
        let pos = state
            .held
            .iter()
            .enumerate()
            .filter(|(_, h)| h.op == op)
            .nth(index)
            .map(|(i, _)| i)
            .expect("no such held call");
        let held = state.held.remove(pos);
        let _ = held.tx.send(err);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn updates(&self) -> Vec<(i64, TaskUpdate)> {
        self.lock().updates.clone()
    }

    pub fn server_status(&self, task_id: i64) -> Option<TaskStatus> {
        self.lock()
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .map(|t| t.status)
    }

    async fn gate(&self, op: Op) -> Result<(), ApiError> {
        let rx = {
            let mut state = self.lock();
            state.calls.push(op);
            if let Some(pos) = state.failures.iter().position(|(o, _)| *o == op) {
                return Err(state.failures.remove(pos).1);
            }
            if !state.holding.contains(&op) {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            state.held.push(Held { op, tx });
            rx
        };
        match rx.await {
            Ok(None) => Ok(()),
            Ok(Some(err)) => Err(err),
            Err(_) => Err(ApiError::Network("held call dropped".into())),
        }
    }

    fn find_task(&self, task_id: i64) -> Result<Task, ApiError> {
        self.lock()
            .tasks
            .iter()
            .find(|t| t.task_id == task_id)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, "Task not found"))
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list_projects(&self, _include_archived: bool) -> Result<Vec<Project>, ApiError> {
        self.gate(Op::ListProjects).await?;
        Ok(vec![project(1)])
    }

    async fn get_project(&self, project_id: i64) -> Result<ProjectWithDetails, ApiError> {
        self.gate(Op::GetProject).await?;
        Ok(ProjectWithDetails {
            project: project(project_id),
            members: self.lock().members.clone(),
            teams: Vec::new(),
        })
    }

    /// Answers with the tasks as they were when the call was made, even if
    /// the call is held and released later.
    async fn list_tasks(&self, project_id: i64, filter: &Filter) -> Result<Vec<Task>, ApiError> {
        let tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id && !t.is_archived && filter.matches(t))
            .cloned()
            .collect();
        self.gate(Op::ListTasks).await?;
        Ok(tasks)
    }

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError> {
        self.gate(Op::GetTask).await?;
        self.find_task(task_id)
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        self.gate(Op::CreateTask).await?;
        let task_id = self.next_id();
        let task = Task {
            task_id,
            project_id: new_task.project_id,
            parent_task_id: new_task.parent_task_id,
            name: new_task.name.clone(),
            description: new_task.description.clone(),
            assignee_id: new_task.assignee_id,
            status: new_task.status,
            severity: new_task.severity,
            priority: new_task.priority,
            due_date: new_task.due_date.clone(),
            created_by: 1,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: "2024-01-01T00:00:00".to_string(),
            is_archived: false,
            tags: new_task.tags.iter().cloned().collect(),
            assignee: None,
            creator: None,
            attachments: Vec::new(),
            subtask_count: 0,
        };
        self.lock().tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.gate(Op::UpdateTask).await?;
        let mut state = self.lock();
        state.updates.push((task_id, update.clone()));
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| ApiError::from_status(404, "Task not found"))?;
        if let Some(ref name) = update.name {
            task.name = name.clone();
        }
        if let Some(ref description) = update.description {
            task.description = Some(description.clone());
        }
        if let Some(assignee_id) = update.assignee_id {
            task.assignee_id = (assignee_id != 0).then_some(assignee_id);
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(severity) = update.severity {
            task.severity = severity;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(ref tags) = update.tags {
            task.tags = tags.iter().cloned().collect();
        }
        task.updated_at = "2024-06-01T00:00:00".to_string();
        Ok(task.clone())
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), ApiError> {
        self.gate(Op::DeleteTask).await?;
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.task_id != task_id);
        if state.tasks.len() == before {
            return Err(ApiError::from_status(404, "Task not found"));
        }
        Ok(())
    }

    async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.gate(Op::ListComments).await?;
        Ok(self
            .lock()
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn create_comment(&self, task_id: i64, text: &str) -> Result<Comment, ApiError> {
        self.gate(Op::CreateComment).await?;
        let comment = Comment {
            comment_id: self.next_id(),
            task_id,
            person_id: 1,
            text: text.to_string(),
            is_system_comment: false,
            created_at: "2024-01-01T00:00:00".to_string(),
            edited_at: None,
            person: None,
            attachments: Vec::new(),
        };
        self.lock().comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, comment_id: i64, text: &str) -> Result<Comment, ApiError> {
        self.gate(Op::UpdateComment).await?;
        let mut state = self.lock();
        let comment = state
            .comments
            .iter_mut()
            .find(|c| c.comment_id == comment_id)
            .ok_or_else(|| ApiError::from_status(404, "Comment not found"))?;
        comment.text = text.to_string();
        comment.edited_at = Some("2024-06-01T00:00:00".to_string());
        Ok(comment.clone())
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.gate(Op::DeleteComment).await?;
        self.lock().comments.retain(|c| c.comment_id != comment_id);
        Ok(())
    }

    async fn upload_task_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<i64, ApiError> {
        self.gate(Op::UploadAttachment).await?;
        let attachment_id = self.next_id();
        let mut state = self.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_id == task_id)
            .ok_or_else(|| ApiError::from_status(404, "Task not found"))?;
        task.attachments.push(Attachment {
            attachment_id,
            file_name: upload.file_name,
            file_type: upload.content_type,
            uploaded_by: 1,
            uploaded_at: "2024-01-01T00:00:00".to_string(),
        });
        Ok(attachment_id)
    }

    async fn delete_task_attachment(&self, attachment_id: i64) -> Result<(), ApiError> {
        self.gate(Op::DeleteAttachment).await?;
        for task in self.lock().tasks.iter_mut() {
            task.attachments.retain(|a| a.attachment_id != attachment_id);
        }
        Ok(())
    }
}

fn project(project_id: i64) -> Project {
    Project {
        project_id,
        name: format!("Project {}", project_id),
        description: None,
        created_by: 1,
        created_at: "2024-01-01T00:00:00".to_string(),
        is_archived: false,
    }
}
