use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow status of a task. The declaration order is the column order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    Planning,
    Development,
    Testing,
    Finished,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        Self::NotStarted,
        Self::Planning,
        Self::Development,
        Self::Testing,
        Self::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Planning => "PLANNING",
            Self::Development => "DEVELOPMENT",
            Self::Testing => "TESTING",
            Self::Finished => "FINISHED",
        }
    }

    /// Display title of the column that renders this status.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NotStarted => "To Do",
            Self::Planning => "Planning",
            Self::Development => "In Progress",
            Self::Testing => "Testing",
            Self::Finished => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    /// Accepts the wire form (`NOT_STARTED`) in any case, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "PLANNING" => Ok(Self::Planning),
            "DEVELOPMENT" => Ok(Self::Development),
            "TESTING" => Ok(Self::Testing),
            "FINISHED" => Ok(Self::Finished),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

/// A board column: a status rendered as a drop zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub status: TaskStatus,
    pub title: &'static str,
}

/// The fixed column sequence. Defines render order and the valid drop targets.
pub const COLUMNS: [Column; 5] = [
    Column { status: TaskStatus::NotStarted, title: "To Do" },
    Column { status: TaskStatus::Planning, title: "Planning" },
    Column { status: TaskStatus::Development, title: "In Progress" },
    Column { status: TaskStatus::Testing, title: "Testing" },
    Column { status: TaskStatus::Finished, title: "Done" },
];

/// Severity or priority on the 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("Must be between 1 and 5, got {}", value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid level: {}", s))?;
        Self::try_from(value)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonBrief {
    pub person_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub attachment_id: i64,
    pub file_name: String,
    pub file_type: String,
    pub uploaded_by: i64,
    pub uploaded_at: String,
}

/// Tags are read as `[{"tag": "x"}]` and held as a set.
mod tag_list {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct TaskTag {
        tag: String,
    }

    pub fn serialize<S: Serializer>(tags: &BTreeSet<String>, s: S) -> Result<S::Ok, S::Error> {
        let wrapped: Vec<TaskTag> = tags.iter().map(|t| TaskTag { tag: t.clone() }).collect();
        wrapped.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
        let wrapped = Vec::<TaskTag>::deserialize(d)?;
        Ok(wrapped.into_iter().map(|t| t.tag).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: i64,
    pub project_id: i64,
    #[serde(default)]
    pub parent_task_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    pub status: TaskStatus,
    pub severity: Level,
    pub priority: Level,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, with = "tag_list")]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub assignee: Option<PersonBrief>,
    #[serde(default)]
    pub creator: Option<PersonBrief>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub subtask_count: i64,
}

/// In-place change to one cached task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub updated_at: Option<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn updated_at(updated_at: impl Into<String>) -> Self {
        Self {
            updated_at: Some(updated_at.into()),
            ..Self::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(ref updated_at) = self.updated_at {
            task.updated_at = updated_at.clone();
        }
    }
}

/// Partial update body for `PATCH /tasks/{id}`.
///
/// `assignee_id: Some(0)` clears the assignee.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Body for `POST /tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub project_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    pub status: TaskStatus,
    pub severity: Level,
    pub priority: Level,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn named(project_id: i64, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            parent_task_id: None,
            assignee_id: None,
            status: TaskStatus::default(),
            severity: Level::default(),
            priority: Level::default(),
            due_date: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAttachment {
    pub attachment_id: i64,
    pub file_name: String,
    pub file_type: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: i64,
    pub task_id: i64,
    pub person_id: i64,
    pub text: String,
    #[serde(default)]
    pub is_system_comment: bool,
    pub created_at: String,
    #[serde(default)]
    pub edited_at: Option<String>,
    #[serde(default)]
    pub person: Option<PersonBrief>,
    #[serde(default)]
    pub attachments: Vec<CommentAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: String,
    #[serde(default)]
    pub is_archived: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectRole {
    Admin,
    Member,
    Viewer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub person: PersonBrief,
    pub role: ProjectRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_by: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectTeam {
    pub team: Team,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectWithDetails {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    #[serde(default)]
    pub teams: Vec<ProjectTeam>,
}

impl ProjectWithDetails {
    /// The people a task on this project can be assigned to.
    pub fn assignees(&self) -> Vec<PersonBrief> {
        self.members.iter().map(|m| m.person.clone()).collect()
    }
}

/// Client-side predicate narrowing the visible tasks. `None` matches all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Level>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee_id.is_none() && self.severity.is_none()
    }

    /// Whether `task` passes every field that is set.
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.assignee_id.is_none_or(|a| task.assignee_id == Some(a))
            && self.severity.is_none_or(|s| task.severity == s)
    }

    /// Query-string pairs for `GET /tasks`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(assignee_id) = self.assignee_id {
            pairs.push(("assignee_id", assignee_id.to_string()));
        }
        if let Some(severity) = self.severity {
            pairs.push(("severity", severity.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A minimal task as the server would return it.
    pub fn task(task_id: i64, status: TaskStatus) -> Task {
        Task {
            task_id,
            project_id: 1,
            parent_task_id: None,
            name: format!("Task {}", task_id),
            description: None,
            assignee_id: None,
            status,
            severity: Level::default(),
            priority: Level::default(),
            due_date: None,
            created_by: 1,
            created_at: "2024-01-01T00:00:00".to_string(),
            updated_at: "2024-01-01T00:00:00".to_string(),
            is_archived: false,
            tags: BTreeSet::new(),
            assignee: None,
            creator: None,
            attachments: Vec::new(),
            subtask_count: 0,
        }
    }
}
