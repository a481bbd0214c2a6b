//! Raw HTTP exchange underneath the API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, StatusCode};
use tracing::debug;
use url::Url;

use super::ApiError;

/// One outbound request, relative to the configured base endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Ok for 2xx, otherwise the classified error
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }
}

/// Sends a request and returns whatever status the server answered with.
/// Only failures to obtain a response at all are errors here.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Transport over a pooled reqwest client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
        })
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| ApiError::Transport(format!("Invalid path {}: {}", request.path, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

/// Normalize the base endpoint so relative joins keep its path prefix.
pub fn parse_base_url(base_url: &str) -> anyhow::Result<Url> {
    let mut normalized = base_url.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| anyhow::anyhow!("Invalid API base URL {}: {}", base_url, e))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_keeps_base_prefix() {
        let transport =
            ReqwestTransport::new("https://api.example.com/v1", Duration::from_secs(5)).unwrap();
        let request = ApiRequest::get("/books/by-genre/Science%20Fiction")
            .query("page", 2)
            .query("limit", 20);
        let url = transport.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/books/by-genre/Science%20Fiction?page=2&limit=20"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert_eq!(
            parse_base_url("http://localhost:8000").unwrap().as_str(),
            "http://localhost:8000/"
        );
    }

    #[test]
    fn test_into_result() {
        assert!(ApiResponse::new(StatusCode::OK, "{}").into_result().is_ok());
        let err = ApiResponse::new(StatusCode::UNAUTHORIZED, "").into_result().unwrap_err();
        assert!(err.is_unauthorized());
    }
}
