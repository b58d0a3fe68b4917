//! HTTP client for the device-management service

use std::time::Duration;

use async_trait::async_trait;
use cdo_core::api::{ApiError, Method};
use cdo_core::transaction::{Transaction, TransactionApi, TransactionRequest};
use cdo_core::types::ApiConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::ClientError;

/// Settings for a [`CdoClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    /// Settings for `base_url` with the remaining values at their defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = ApiConfig::default();
        Self {
            base_url: base_url.into(),
            api_token: None,
            http_timeout: Duration::from_secs(defaults.http_timeout_secs),
            user_agent: defaults.user_agent,
        }
    }

    pub fn from_api_config(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            api_token: None,
            http_timeout: Duration::from_secs(api.http_timeout_secs),
            user_agent: api.user_agent.clone(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// JSON client with bearer-token auth against a base URL
///
/// Cheap to share: requests go through one `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct CdoClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CdoClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| {
            ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.http_timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path against the base URL; absolute URLs pass through
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path).map_err(|e| ApiError::Transport(format!("{}: {}", path, e)));
        }
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Transport(format!("{}: {}", path, e)))
    }

    /// Send a request and check its status
    ///
    /// 404 maps to [`ApiError::NotFound`], any other non-2xx status to
    /// [`ApiError::Status`] with the response body.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path)?;
        debug!(%method, %url, "Sending request");

        let mut request = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        };
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        trace!(%status, path, "Received response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(path));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::status(status.as_u16(), body));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(Method::Get, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = to_value(body)?;
        self.send_json(Method::Post, path, Some(&body)).await
    }

    /// PUT `body` to `path`, checking the status but ignoring any response body
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let body = to_value(body)?;
        self.send(Method::Put, path, Some(&body)).await.map(|_| ())
    }

    /// DELETE `path`, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, None).await.map(|_| ())
    }
}

fn to_value<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl TransactionApi for CdoClient {
    async fn trigger(&self, request: &TransactionRequest) -> Result<Transaction, ApiError> {
        self.send_json(request.method, &request.path, request.body.as_ref())
            .await
    }

    async fn fetch(&self, polling_url: &str) -> Result<Transaction, ApiError> {
        self.get(polling_url).await
    }
}
