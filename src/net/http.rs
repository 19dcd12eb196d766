//! Shared HTTP-client contract: bearer injection and 401 invalidation.
//!
//! DESIGN
//! ======
//! `Transport` is the single network seam. `HttpClient` implements it over
//! `reqwest`; tests substitute an in-memory transport. Every request carries
//! `Authorization: Bearer <token>` when the injected `CredentialStore` has a
//! token. Requests marked `AuthMode::Required` fail with `MissingCredential`
//! before touching the network when it does not.
//!
//! ERROR HANDLING
//! ==============
//! A 401 clears the credential store, fires the injected `on_unauthorized`
//! callback (the embedding app decides what "log in again" means), and is
//! returned as `ClientError::Unauthorized`. Every other status, including
//! 429 and 5xx, is handed back as an `HttpReply` so callers can apply their
//! own status rules.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ClientError;

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Source of the opaque bearer token.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn clear(&self);
}

/// In-memory token holder.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { token: RwLock::new(token) }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.into());
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self
            .token
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// Callback fired after a 401 has invalidated the credential.
pub type OnUnauthorized = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// REQUEST / REPLY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the token when one exists.
    Optional,
    /// Refuse to send without a token.
    Required,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub auth: AuthMode,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None, auth: AuthMode::Optional }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::POST, path: path.into(), body: Some(body), auth: AuthMode::Optional }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::DELETE, path: path.into(), body: None, auth: AuthMode::Optional }
    }

    #[must_use]
    pub fn require_auth(mut self) -> Self {
        self.auth = AuthMode::Required;
        self
    }
}

/// Status and raw body of any non-401 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResponse` when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_str(&self.body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// String field from a JSON object body, if the body is one and the
    /// field is a non-empty string.
    #[must_use]
    pub fn json_field(&self, key: &str) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, ClientError>;
}

/// `reqwest`-backed transport.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    on_unauthorized: OnUnauthorized,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the underlying client cannot be constructed.
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ClientError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), credentials, on_unauthorized })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn invalidate(&self) {
        warn!("server rejected credential; invalidating");
        self.credentials.clear();
        (self.on_unauthorized)();
    }
}

#[async_trait::async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, ClientError> {
        let token = self.credentials.token();
        if token.is_none() && request.auth == AuthMode::Required {
            return Err(ClientError::MissingCredential);
        }

        let mut builder = self.http.request(request.method.clone(), self.url(&request.path));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(method = %request.method, path = %request.path, status, "http response");

        if status == 401 {
            self.invalidate();
            return Err(ClientError::Unauthorized);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;
