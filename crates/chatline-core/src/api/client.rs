//! Authenticated transport for the chat service REST API.
//!
//! `ApiClient` resolves paths against the configured base origin, attaches
//! the bearer token from the `CredentialStore`, and classifies every outcome
//! into an `ApiError`. It performs no side effects beyond the network call;
//! reacting to failures is the caller's job.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::CredentialStore;

use super::ApiError;

/// Default base origin of the chat service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
/// A timed-out request surfaces as `ApiError::Timeout`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, credentials: CredentialStore) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot have paths resolved against it: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Resolve path segments against the base, with a trailing slash.
    /// Each segment is percent-encoded, so ids cannot escape their position.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::ValidationFailure(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    // ===== Typed request helpers =====

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self.send(Method::GET, segments, None, true).await?;
        Self::parse(response).await
    }

    /// POST with a JSON body
    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = Self::to_json(body)?;
        let response = self.send(Method::POST, segments, Some(body), true).await?;
        Self::parse(response).await
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let response = self.send(Method::POST, segments, None, true).await?;
        Self::parse(response).await
    }

    /// DELETE, ignoring whatever the server echoes back
    pub async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send(Method::DELETE, segments, None, true).await?;
        Ok(())
    }

    /// Authenticated GET that only cares whether the server accepts it
    pub async fn probe(&self, segments: &[&str]) -> Result<(), ApiError> {
        self.send(Method::GET, segments, None, true).await?;
        Ok(())
    }

    /// POST without credentials, for endpoints like login
    pub async fn post_anonymous<T, B>(&self, segments: &[&str], body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = Self::to_json(body)?;
        let response = self.send(Method::POST, segments, Some(body), false).await?;
        Self::parse(response).await
    }

    // ===== Core request path =====

    /// Issue one request and classify the outcome.
    ///
    /// When `authenticated` is set and no token is stored, returns
    /// `Unauthenticated` without touching the network. The token is read at
    /// call time, never cached.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Response, ApiError> {
        let token = if authenticated {
            Some(self.credentials.get_token().ok_or(ApiError::Unauthenticated)?)
        } else {
            None
        };

        let url = self.endpoint(segments)?;
        debug!(%method, %url, authenticated, "Sending request");

        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(ApiError::from_transport)?;
        Self::check_response(response).await
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            debug!(%status, "Request succeeded");
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().clone();
        let text = response.text().await.map_err(ApiError::from_transport)?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url.path(), e))
        })
    }

    fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::ValidationFailure(format!("Unserializable request body: {}", e)))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
