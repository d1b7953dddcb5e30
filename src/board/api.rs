//! Client side of the task API.
//!
//! [`TaskApi`] is the request/response contract the board core consumes;
//! [`HttpTaskApi`] implements it over HTTP with `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::*;
use crate::errors::ApiError;

/// Default request timeout when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A file to attach to a task.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>, ApiError>;

    async fn get_project(&self, project_id: i64) -> Result<ProjectWithDetails, ApiError>;

    /// The server applies the filter's fields as equality matches.
    async fn list_tasks(&self, project_id: i64, filter: &Filter) -> Result<Vec<Task>, ApiError>;

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError>;

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError>;

    async fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<Task, ApiError>;

    async fn delete_task(&self, task_id: i64) -> Result<(), ApiError>;

    async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ApiError>;

    async fn create_comment(&self, task_id: i64, text: &str) -> Result<Comment, ApiError>;

    async fn update_comment(&self, comment_id: i64, text: &str) -> Result<Comment, ApiError>;

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError>;

    /// Returns the new attachment's id.
    async fn upload_task_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<i64, ApiError>;

    async fn delete_task_attachment(&self, attachment_id: i64) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct NewComment<'a> {
    task_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct CommentEdit<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    attachment_id: i64,
}

/// Error body shape returned by the server. `detail` is a string for
/// handled errors and a list of field errors for schema validation.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP implementation of [`TaskApi`].
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTaskApi {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tasker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the browser (or `curl`) can fetch an attachment's bytes from.
    pub fn attachment_download_url(&self, attachment_id: i64) -> String {
        format!(
            "{}/attachments/task/{}/download",
            self.base_url, attachment_id
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let resp = check_status(builder.send().await?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        check_status(builder.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success response into the matching [`ApiError`].
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let detail = match resp.json::<ErrorBody>().await {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => "Request failed".to_string(),
    };
    tracing::debug!(status = status.as_u16(), %detail, "task API rejected request");
    Err(ApiError::from_status(status.as_u16(), detail))
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>, ApiError> {
        self.send_json(
            self.request(Method::GET, "/projects")
                .query(&[("include_archived", include_archived)]),
        )
        .await
    }

    async fn get_project(&self, project_id: i64) -> Result<ProjectWithDetails, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/projects/{}", project_id)))
            .await
    }

    async fn list_tasks(&self, project_id: i64, filter: &Filter) -> Result<Vec<Task>, ApiError> {
        let mut query = vec![("project_id", project_id.to_string())];
        query.extend(filter.query_pairs());
        self.send_json(self.request(Method::GET, "/tasks").query(&query))
            .await
    }

    async fn get_task(&self, task_id: i64) -> Result<Task, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/tasks/{}", task_id)))
            .await
    }

    async fn create_task(&self, new_task: &NewTask) -> Result<Task, ApiError> {
        self.send_json(self.request(Method::POST, "/tasks").json(new_task))
            .await
    }

    async fn update_task(&self, task_id: i64, update: &TaskUpdate) -> Result<Task, ApiError> {
        self.send_json(
            self.request(Method::PATCH, &format!("/tasks/{}", task_id))
                .json(update),
        )
        .await
    }

    async fn delete_task(&self, task_id: i64) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/tasks/{}", task_id)))
            .await
    }

    async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.send_json(self.request(Method::GET, &format!("/comments/task/{}", task_id)))
            .await
    }

    async fn create_comment(&self, task_id: i64, text: &str) -> Result<Comment, ApiError> {
        self.send_json(
            self.request(Method::POST, "/comments")
                .json(&NewComment { task_id, text }),
        )
        .await
    }

    async fn update_comment(&self, comment_id: i64, text: &str) -> Result<Comment, ApiError> {
        self.send_json(
            self.request(Method::PATCH, &format!("/comments/{}", comment_id))
                .json(&CommentEdit { text }),
        )
        .await
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("/comments/{}", comment_id)))
            .await
    }

    async fn upload_task_attachment(
        &self,
        task_id: i64,
        upload: AttachmentUpload,
    ) -> Result<i64, ApiError> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp: UploadResponse = self
            .send_json(
                self.request(Method::POST, &format!("/attachments/task/{}", task_id))
                    .multipart(form),
            )
            .await?;
        Ok(resp.attachment_id)
    }

    async fn delete_task_attachment(&self, attachment_id: i64) -> Result<(), ApiError> {
        self.send_empty(self.request(
            Method::DELETE,
            &format!("/attachments/task/{}", attachment_id),
        ))
        .await
    }
}
