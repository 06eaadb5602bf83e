//! Reqwest-backed adapter for the remote user service.
//!
//! Owns transport details only: URL building, auth headers, timeout and HTTP
//! error mapping, and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, UserId, UserPage, UserPatch, UserService};

pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP implementation of [`UserService`].
#[derive(Clone, Debug)]
pub struct HttpUserService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

impl HttpUserService {
    /// Build a client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn with_api_key(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key.as_str()),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.with_api_key(req).send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        Err(map_status_error(status, body.as_ref()))
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn list_page(&self, page: u32) -> Result<UserPage, ApiError> {
        let url = self.endpoint("users");
        debug!(%url, page, "GET users page");
        let response = self.send(self.client.get(&url).query(&[("page", page)])).await?;
        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("users page {page}: {e}")))
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("users/{id}"));
        debug!(%url, id, "PUT user");
        self.send(self.client.put(&url).bearer_auth(token).json(patch)).await?;
        Ok(())
    }

    async fn delete_user(&self, id: UserId, token: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("users/{id}"));
        debug!(%url, id, "DELETE user");
        self.send(self.client.delete(&url).bearer_auth(token)).await?;
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint("login");
        debug!(%url, email, "POST login");
        let response = self
            .send(self.client.post(&url).json(&LoginRequest { email, password }))
            .await?;
        let body = response.bytes().await.map_err(map_transport_error)?;
        let decoded: LoginResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::Decode(format!("login: {e}")))?;
        Ok(decoded.token)
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(error.to_string())
    } else {
        ApiError::Network(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        preview
    };
    ApiError::Status { status: status.as_u16(), message }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 120;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
