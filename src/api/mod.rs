//! Thin client for the GreenCity portal API (`/token`, `/users/`, `/ideas/`).
//! No retries and no caching: every call is one request.

pub mod error;
pub mod token_store;
pub mod transport;
pub mod types;

use serde::de::DeserializeOwned;
use serde_json::json;

pub use error::ApiError;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, ScriptedTransport, Transport};
pub use types::{Idea, NewIdea, NewUser, Token, User};

#[derive(Debug, Clone)]
pub struct ApiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `POST /token` with form-encoded credentials.
    pub fn login(&self, email: &str, password: &str) -> Result<Token, ApiError> {
        let req = ApiRequest::new(Method::Post, "/token").form(&[("username", email), ("password", password)]);
        self.call(req)
    }

    pub fn register(&self, user: &NewUser) -> Result<User, ApiError> {
        let req = ApiRequest::new(Method::Post, "/users/").json(serde_json::to_value(user)?);
        self.call(req)
    }

    pub fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.call(ApiRequest::new(Method::Get, "/users/me").bearer(Some(token)))
    }

    pub fn list_users(&self, token: Option<&str>) -> Result<Vec<User>, ApiError> {
        self.call(ApiRequest::new(Method::Get, "/users/").bearer(token))
    }

    pub fn delete_user(&self, token: &str, user_id: i64) -> Result<(), ApiError> {
        let req = ApiRequest::new(Method::Delete, format!("/users/{user_id}")).bearer(Some(token));
        self.call_empty(req)
    }

    pub fn list_ideas(&self) -> Result<Vec<Idea>, ApiError> {
        self.call(ApiRequest::new(Method::Get, "/ideas/"))
    }

    pub fn post_idea(&self, token: &str, idea: &str) -> Result<Idea, ApiError> {
        let req = ApiRequest::new(Method::Post, "/ideas/")
            .bearer(Some(token))
            .json(json!({ "idea": idea }));
        self.call(req)
    }

    pub fn delete_idea(&self, token: &str, idea_id: i64) -> Result<(), ApiError> {
        let req = ApiRequest::new(Method::Delete, format!("/ideas/{idea_id}")).bearer(Some(token));
        self.call_empty(req)
    }

    fn call<R: DeserializeOwned>(&self, req: ApiRequest) -> Result<R, ApiError> {
        let response = self.exchange(req)?;
        Ok(serde_json::from_str(&response.body)?)
    }

    fn call_empty(&self, req: ApiRequest) -> Result<(), ApiError> {
        self.exchange(req).map(|_| ())
    }

    fn exchange(&self, req: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = req.method;
        let path = req.path.clone();
        let response = self.transport.send(req).inspect_err(|e| {
            tracing::warn!(?method, %path, error = %e, "api request failed");
        })?;
        tracing::debug!(?method, %path, status = response.status, "api response");
        if response.is_success() {
            return Ok(response);
        }
        let detail = error_detail(&response.body);
        Err(match response.status {
            401 => ApiError::Unauthorized { detail },
            status => ApiError::Status { status, detail },
        })
    }
}

/// `detail` of an error body. Validation errors carry a list; its first
/// `msg` is used.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items
            .first()
            .and_then(|i| i.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}
