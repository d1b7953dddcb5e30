//! In-process mock of the task API used by the integration tests.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";
const UPDATED_AT: &str = "2024-06-01T00:00:00";

#[derive(Default)]
pub struct MockState {
    pub tasks: Vec<Value>,
    pub comments: Vec<Value>,
    pub next_id: i64,
    /// PATCH bodies received for tasks, in arrival order.
    pub patches: Vec<(i64, Value)>,
    /// Status value the server refuses with a 422.
    pub reject_status: Option<String>,
}

pub type Shared = Arc<Mutex<MockState>>;

type ApiReply = (StatusCode, Json<Value>);

pub fn task_json(task_id: i64, project_id: i64, name: &str, status: &str) -> Value {
    json!({
        "task_id": task_id,
        "project_id": project_id,
        "parent_task_id": null,
        "name": name,
        "description": null,
        "assignee_id": null,
        "status": status,
        "severity": 3,
        "priority": 3,
        "due_date": null,
        "created_by": 1,
        "created_at": "2024-01-01T00:00:00",
        "updated_at": "2024-01-01T00:00:00",
        "is_archived": false,
        "tags": [],
        "assignee": null,
        "creator": null,
        "attachments": [],
        "subtask_count": 0
    })
}

/// Project 1 with four tasks, one in each of the first four columns.
pub fn seeded() -> Shared {
    let mut tasks = vec![
        task_json(1, 1, "Write docs", "NOT_STARTED"),
        task_json(2, 1, "Plan release", "PLANNING"),
        task_json(3, 1, "Fix login bug", "DEVELOPMENT"),
        task_json(4, 1, "Check upload", "TESTING"),
        task_json(5, 2, "Other project", "NOT_STARTED"),
    ];
    tasks[2]["assignee_id"] = json!(7);
    tasks[2]["severity"] = json!(5);
    Arc::new(Mutex::new(MockState {
        tasks,
        next_id: 100,
        ..MockState::default()
    }))
}

fn project_json(project_id: i64, archived: bool) -> Value {
    json!({
        "project_id": project_id,
        "name": format!("Project {}", project_id),
        "description": null,
        "created_by": 1,
        "created_at": "2024-01-01T00:00:00",
        "is_archived": archived
    })
}

fn fail(status: StatusCode, detail: &str) -> ApiReply {
    (status, Json(json!({ "detail": detail })))
}

fn authorize(headers: &HeaderMap) -> Result<(), ApiReply> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(fail(StatusCode::UNAUTHORIZED, "Not authenticated")),
    }
}

fn next_id(state: &mut MockState) -> i64 {
    state.next_id += 1;
    state.next_id
}

async fn list_projects(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let mut projects = vec![project_json(1, false), project_json(2, false)];
    if query.get("include_archived").map(String::as_str) == Some("true") {
        projects.push(project_json(3, true));
    }
    Ok(Json(Value::Array(projects)))
}

async fn get_project(headers: HeaderMap, Path(id): Path<i64>) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    if !(1..=3).contains(&id) {
        return Err(fail(StatusCode::NOT_FOUND, "Project not found"));
    }
    let mut project = project_json(id, id == 3);
    project["members"] = json!([
        {"person": {"person_id": 7, "name": "Ana", "email": "ana@example.com"}, "role": "ADMIN"},
        {"person": {"person_id": 8, "name": "Bo", "email": "bo@example.com"}, "role": "MEMBER"}
    ]);
    project["teams"] = json!([]);
    Ok(Json(project))
}

async fn list_tasks(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let matches = |task: &Value, key: &str| match query.get(key) {
        Some(wanted) => match &task[key] {
            Value::String(s) => s == wanted,
            other => other.to_string() == *wanted,
        },
        None => true,
    };
    let state = state.lock().unwrap();
    let tasks: Vec<Value> = state
        .tasks
        .iter()
        .filter(|t| {
            t["is_archived"] == json!(false)
                && matches(t, "project_id")
                && matches(t, "status")
                && matches(t, "assignee_id")
                && matches(t, "severity")
        })
        .cloned()
        .collect();
    Ok(Json(Value::Array(tasks)))
}

async fn get_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let state = state.lock().unwrap();
    state
        .tasks
        .iter()
        .find(|t| t["task_id"] == json!(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Task not found"))
}

async fn create_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<ApiReply, ApiReply> {
    authorize(&headers)?;
    let Some(name) = body["name"].as_str() else {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "name is required"));
    };
    let mut state = state.lock().unwrap();
    let task_id = next_id(&mut state);
    let mut task = task_json(
        task_id,
        body["project_id"].as_i64().unwrap_or(0),
        name,
        body["status"].as_str().unwrap_or("NOT_STARTED"),
    );
    for key in ["severity", "priority", "description", "assignee_id"] {
        if !body[key].is_null() {
            task[key] = body[key].clone();
        }
    }
    state.tasks.push(task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    state.patches.push((id, body.clone()));
    if let (Some(rejected), Some(status)) = (&state.reject_status, body["status"].as_str())
        && rejected == status
    {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "Invalid status transition"));
    }
    let task = state
        .tasks
        .iter_mut()
        .find(|t| t["task_id"] == json!(id))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Task not found"))?;
    for key in ["name", "description", "status", "severity", "priority", "due_date"] {
        if let Some(value) = body.get(key) {
            task[key] = value.clone();
        }
    }
    if let Some(assignee) = body.get("assignee_id") {
        task["assignee_id"] = if assignee == &json!(0) {
            Value::Null
        } else {
            assignee.clone()
        };
    }
    if let Some(Value::Array(tags)) = body.get("tags") {
        task["tags"] = tags.iter().map(|t| json!({ "tag": t })).collect();
    }
    task["updated_at"] = json!(UPDATED_AT);
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiReply> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let before = state.tasks.len();
    state.tasks.retain(|t| t["task_id"] != json!(id));
    if state.tasks.len() == before {
        return Err(fail(StatusCode::NOT_FOUND, "Task not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn list_comments(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(task_id): Path<i64>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let state = state.lock().unwrap();
    let comments: Vec<Value> = state
        .comments
        .iter()
        .filter(|c| c["task_id"] == json!(task_id))
        .cloned()
        .collect();
    Ok(Json(Value::Array(comments)))
}

async fn create_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<ApiReply, ApiReply> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let comment_id = next_id(&mut state);
    let comment = json!({
        "comment_id": comment_id,
        "task_id": body["task_id"],
        "person_id": 7,
        "text": body["text"],
        "is_system_comment": false,
        "created_at": "2024-01-01T00:00:00",
        "edited_at": null,
        "person": {"person_id": 7, "name": "Ana", "email": "ana@example.com"},
        "attachments": []
    });
    state.comments.push(comment.clone());
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn update_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiReply> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    let comment = state
        .comments
        .iter_mut()
        .find(|c| c["comment_id"] == json!(id))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Comment not found"))?;
    comment["text"] = body["text"].clone();
    comment["edited_at"] = json!(UPDATED_AT);
    Ok(Json(comment.clone()))
}

async fn delete_comment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiReply> {
    authorize(&headers)?;
    state
        .lock()
        .unwrap()
        .comments
        .retain(|c| c["comment_id"] != json!(id));
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_attachment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(task_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<ApiReply, ApiReply> {
    authorize(&headers)?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let file_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.unwrap();
            upload = Some((file_name, file_type, bytes.len()));
        }
    }
    let Some((file_name, file_type, _size)) = upload else {
        return Err(fail(StatusCode::UNPROCESSABLE_ENTITY, "file is required"));
    };

    let mut state = state.lock().unwrap();
    let attachment_id = next_id(&mut state);
    let task = state
        .tasks
        .iter_mut()
        .find(|t| t["task_id"] == json!(task_id))
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Task not found"))?;
    let attachment = json!({
        "attachment_id": attachment_id,
        "file_name": file_name,
        "file_type": file_type,
        "uploaded_by": 7,
        "uploaded_at": UPDATED_AT
    });
    if let Some(list) = task["attachments"].as_array_mut() {
        list.push(attachment.clone());
    }
    Ok((StatusCode::CREATED, Json(attachment)))
}

async fn delete_attachment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiReply> {
    authorize(&headers)?;
    let mut state = state.lock().unwrap();
    for task in state.tasks.iter_mut() {
        if let Some(list) = task["attachments"].as_array_mut() {
            list.retain(|a| a["attachment_id"] != json!(id));
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{id}", get(get_project))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/comments", post(create_comment))
        .route("/comments/task/{id}", get(list_comments))
        .route("/comments/{id}", patch(update_comment).delete(delete_comment))
        .route(
            "/attachments/task/{id}",
            post(upload_attachment).delete(delete_attachment),
        )
        .with_state(state);
    Router::new().nest("/api", api)
}

/// Serve the mock on an ephemeral port and return its API base URL.
pub async fn spawn_mock(state: Shared) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// Like [`spawn_mock`] for synchronous tests. Keep the runtime alive for as
/// long as the server is needed.
pub fn spawn_mock_blocking(state: Shared) -> (tokio::runtime::Runtime, String) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let url = runtime.block_on(spawn_mock(state));
    (runtime, url)
}

