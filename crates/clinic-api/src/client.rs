//! JSON-over-HTTP client bound to one backend origin.
//!
//! Every request goes through one shared [`reqwest::Client`] with a cookie
//! store, so the session cookie set by login rides along on every later
//! request, including the session probe.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{ApiError, ErrorBody, Result};

/// HTTP client for the clinic backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    origin: Url,
}

impl ApiClient {
    /// Build a client for `origin` (e.g. `http://localhost:5000`).
    pub fn new(origin: &str, timeout: Duration) -> Result<Self> {
        let origin = Url::parse(origin)?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        debug!(origin = %origin, timeout_ms = timeout.as_millis(), "API client initialized");
        Ok(Self { client, origin })
    }

    /// The backend origin.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Absolute URL for a backend path.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.origin.join(path)?)
    }

    /// `GET` a path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let body = self.execute(self.client.get(url), "GET", path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let body = self
            .execute(self.client.post(url).json(body), "POST", path)
            .await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST` a JSON body, ignoring whatever the backend answers on success.
    pub async fn post_json_unit<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let _ = self
            .execute(self.client.post(url).json(body), "POST", path)
            .await?;
        Ok(())
    }

    /// `POST` with no body, ignoring whatever the backend answers on success.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path)?;
        let _ = self.execute(self.client.post(url), "POST", path).await?;
        Ok(())
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: &'static str,
        path: &str,
    ) -> Result<Vec<u8>> {
        let response = request.send().await.map_err(|e| {
            warn!(method, path, error = %e, "request did not reach backend");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Network)?;

        if !status.is_success() {
            let body = ErrorBody::parse(&body);
            debug!(method, path, status = status.as_u16(), ?body, "backend returned error status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(method, path, status = status.as_u16(), bytes = body.len(), "request ok");
        Ok(body.to_vec())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
