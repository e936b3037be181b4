use crate::error::ApiError;
use crate::models::{
    AssignmentRequest, CompletionRequest, NewTask, Task, TaskUpdate, TripMember, User,
};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Remote trip-planning backend, as far as the checklist needs it.
#[async_trait]
pub trait ChecklistBackend: Send + Sync {
    async fn fetch_tasks(&self, trip_id: u64) -> Result<Vec<Task>, ApiError>;

    async fn create_task(&self, trip_id: u64, task: &NewTask) -> Result<Task, ApiError>;

    async fn update_task(
        &self,
        trip_id: u64,
        task_id: u64,
        update: &TaskUpdate,
    ) -> Result<Task, ApiError>;

    async fn delete_task(&self, trip_id: u64, task_id: u64) -> Result<(), ApiError>;

    async fn complete_task(
        &self,
        trip_id: u64,
        task_id: u64,
        notes: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn uncomplete_task(&self, trip_id: u64, task_id: u64) -> Result<(), ApiError>;

    async fn assign_user(
        &self,
        trip_id: u64,
        task_id: u64,
        user_id: u64,
    ) -> Result<(), ApiError>;

    async fn unassign_user(&self, trip_id: u64, task_id: u64, user_id: u64)
        -> Result<(), ApiError>;

    async fn fetch_trip_members(&self, trip_id: u64) -> Result<Vec<TripMember>, ApiError>;

    /// `None` when the session is missing or rejected.
    async fn fetch_current_user(&self) -> Result<Option<User>, ApiError>;
}

pub mod paths {
    pub fn checklist(trip_id: u64) -> String {
        format!("/trips/{}/checklist", trip_id)
    }

    pub fn task(trip_id: u64, task_id: u64) -> String {
        format!("/trips/{}/checklist/{}", trip_id, task_id)
    }

    pub fn completion(trip_id: u64, task_id: u64) -> String {
        format!("/trips/{}/checklist/{}/complete", trip_id, task_id)
    }

    pub fn assign(trip_id: u64, task_id: u64) -> String {
        format!("/trips/{}/checklist/{}/assign", trip_id, task_id)
    }

    pub fn unassign(trip_id: u64, task_id: u64, user_id: u64) -> String {
        format!("/trips/{}/checklist/{}/assign/{}", trip_id, task_id, user_id)
    }

    pub fn trip_members(trip_id: u64) -> String {
        format!("/trip-member/trip/{}", trip_id)
    }

    pub const CURRENT_USER: &str = "/auth/me";
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, session_cookie: Option<String>) -> Self {
        HttpBackend {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_cookie,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = method.as_str(), url = url.as_str(), "sending request");
        let builder = self.client.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let res = builder.send().await?;
        if res.status().is_success() {
            Ok(res)
        } else {
            Err(status_error(res).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let res = self.send(builder).await?;
        Ok(res.json::<T>().await?)
    }
}

async fn status_error(res: Response) -> ApiError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    ApiError::Status {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

// Prefers a `message` or `error` field, then the raw body, then the reason phrase
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = map.get(key) {
                return msg.clone();
            }
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[async_trait]
impl ChecklistBackend for HttpBackend {
    async fn fetch_tasks(&self, trip_id: u64) -> Result<Vec<Task>, ApiError> {
        self.send_json(self.request(reqwest::Method::GET, &paths::checklist(trip_id)))
            .await
    }

    async fn create_task(&self, trip_id: u64, task: &NewTask) -> Result<Task, ApiError> {
        let req = self
            .request(reqwest::Method::POST, &paths::checklist(trip_id))
            .json(task);
        self.send_json(req).await
    }

    async fn update_task(
        &self,
        trip_id: u64,
        task_id: u64,
        update: &TaskUpdate,
    ) -> Result<Task, ApiError> {
        let req = self
            .request(reqwest::Method::PUT, &paths::task(trip_id, task_id))
            .json(update);
        self.send_json(req).await
    }

    async fn delete_task(&self, trip_id: u64, task_id: u64) -> Result<(), ApiError> {
        self.send(self.request(reqwest::Method::DELETE, &paths::task(trip_id, task_id)))
            .await?;
        Ok(())
    }

    async fn complete_task(
        &self,
        trip_id: u64,
        task_id: u64,
        notes: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = CompletionRequest {
            notes: notes.map(str::to_string),
        };
        let req = self
            .request(reqwest::Method::POST, &paths::completion(trip_id, task_id))
            .json(&body);
        // the completion record in the body is not used; any 2xx counts
        self.send(req).await?;
        Ok(())
    }

    async fn uncomplete_task(&self, trip_id: u64, task_id: u64) -> Result<(), ApiError> {
        let req = self.request(reqwest::Method::DELETE, &paths::completion(trip_id, task_id));
        self.send(req).await?;
        Ok(())
    }

    async fn assign_user(
        &self,
        trip_id: u64,
        task_id: u64,
        user_id: u64,
    ) -> Result<(), ApiError> {
        let req = self
            .request(reqwest::Method::POST, &paths::assign(trip_id, task_id))
            .json(&AssignmentRequest {
                assigned_to: user_id,
            });
        self.send(req).await?;
        Ok(())
    }

    async fn unassign_user(
        &self,
        trip_id: u64,
        task_id: u64,
        user_id: u64,
    ) -> Result<(), ApiError> {
        let req = self.request(
            reqwest::Method::DELETE,
            &paths::unassign(trip_id, task_id, user_id),
        );
        self.send(req).await?;
        Ok(())
    }

    async fn fetch_trip_members(&self, trip_id: u64) -> Result<Vec<TripMember>, ApiError> {
        self.send_json(self.request(reqwest::Method::GET, &paths::trip_members(trip_id)))
            .await
    }

    async fn fetch_current_user(&self) -> Result<Option<User>, ApiError> {
        let res = self
            .request(reqwest::Method::GET, paths::CURRENT_USER)
            .send()
            .await?;
        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => Ok(Some(res.json::<User>().await?)),
            _ => Err(status_error(res).await),
        }
    }
}
