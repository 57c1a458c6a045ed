use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::api::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), bearer: None, body: RequestBody::Empty }
    }

    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = RequestBody::Form(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP exchange. Network failures map to `ApiError::Unreachable`; any
/// status code, including errors, is returned as a response.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unreachable(format!("http client init failed: {e}")))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };
        let response = builder
            .send()
            .map_err(|e| ApiError::Unreachable(format!("{url}: request error: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ApiError::Unreachable(format!("{url}: body read error: {e}")))?;
        Ok(ApiResponse { status, body })
    }
}

/// In-memory transport replaying queued responses and recording requests.
/// Stands in for the server in the client, portal and worker tests.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ApiResponse, String>>>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
        self.push(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()));
        self
    }

    fn push(&self, reply: Result<ApiResponse, String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let path = request.path.clone();
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(ApiError::Unreachable(reason)),
            None => Err(ApiError::Unreachable(format!("no scripted reply for {path}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let r = ApiRequest::new(Method::Post, "/token")
            .bearer(None)
            .form(&[("username", "a@b.fr"), ("password", "pw")]);
        assert_eq!(r.bearer, None);
        assert_eq!(
            r.body,
            RequestBody::Form(vec![
                ("username".to_string(), "a@b.fr".to_string()),
                ("password".to_string(), "pw".to_string()),
            ])
        );
    }

    #[test]
    fn scripted_replays_in_order() {
        let t = ScriptedTransport::new().reply(200, "[]").fail("offline");
        assert_eq!(t.send(ApiRequest::new(Method::Get, "/ideas/")).unwrap().status, 200);
        assert!(t.send(ApiRequest::new(Method::Get, "/ideas/")).unwrap_err().is_network());
        assert!(t.send(ApiRequest::new(Method::Get, "/users/")).is_err());
        assert_eq!(t.requests().len(), 3);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let t = ReqwestTransport::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.base_url(), "http://localhost:8000");
    }
}
