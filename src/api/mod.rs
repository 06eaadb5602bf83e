//! Remote user service port and its wire types.
//!
//! The dashboard talks to a reqres-style REST API. Everything the rest of the
//! crate needs from it goes through the [`UserService`] trait so the
//! controller can be driven by the HTTP adapter ([`http::HttpUserService`])
//! or by an in-memory double in tests.
//!
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpUserService;

/// Identifier assigned by the remote service.
pub type UserId = u32;

/// One user record as returned by `GET /users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One page of users. `per_page` and `total` are optional on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    pub total_pages: u32,
    pub data: Vec<User>,
}

/// Partial update body for `PUT /users/{id}`. Only supplied fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserPatch {
    /// Build a patch from edit-form values; blank values count as "not supplied".
    pub fn from_form(first_name: &str, last_name: &str, email: &str) -> Self {
        fn supplied(v: &str) -> Option<String> {
            let t = v.trim();
            if t.is_empty() { None } else { Some(t.to_string()) }
        }
        Self {
            first_name: supplied(first_name),
            last_name: supplied(last_name),
            email: supplied(email),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    /// Merge supplied fields into `user`, keeping the rest.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = v.clone();
        }
    }
}

/// Bearer credentials used for mutating requests.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub token: Option<String>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self { token: token.filter(|t| !t.trim().is_empty()) }
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn bearer(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::MissingToken)
    }
}

/// Failures talking to the remote service.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("not signed in: a bearer token is required")]
    MissingToken,
}

/// Operations the dashboard performs against the remote user service.
#[async_trait]
pub trait UserService: Send + Sync {
    /// `GET /users?page={page}`
    async fn list_page(&self, page: u32) -> Result<UserPage, ApiError>;

    /// `PUT /users/{id}` with a partial body. The response body is ignored.
    async fn update_user(&self, id: UserId, patch: &UserPatch, token: &str) -> Result<(), ApiError>;

    /// `DELETE /users/{id}`
    async fn delete_user(&self, id: UserId, token: &str) -> Result<(), ApiError>;

    /// `POST /login`, returning a bearer token.
    async fn login(&self, email: &str, password: &str) -> Result<String, ApiError>;
}
