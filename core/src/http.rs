//! HTTP transport for the Shlink REST API.
//!
//! # Design
//! Requests and responses are plain data. `HttpClient` builds an
//! `HttpRequest`, hands it to a `RequestExecutor` for the actual I/O, and
//! parses the `HttpResponse` it gets back. The build and parse halves never
//! touch the network, so they are tested directly; the executor is the only
//! piece that does I/O and can be swapped for an in-memory one.
//!
//! Resource clients only see the `ShlinkTransport` trait, which speaks in
//! paths, query parameters and decoded JSON.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use ureq::typestate::WithBody;
use url::Url;

use crate::config::ShlinkConfig;
use crate::error::{HttpError, Result, ShlinkError};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Ordered query parameters. Keys may repeat (`tags[]=a&tags[]=b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Replace every value of `key` with a single `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.retain(|(k, _)| k != key);
        self.push(key, value);
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The capability resource clients need from the HTTP layer.
///
/// Paths are relative to the versioned REST root (`/short-urls`, `/tags`).
/// A non-2xx answer fails with `ShlinkError::Http`; a missing answer with
/// `ShlinkError::Transport`.
pub trait ShlinkTransport {
    fn get_from_shlink(&self, path: &str, query: &QueryParams) -> Result<Value>;

    fn call_shlink_with_body(
        &self,
        path: &str,
        method: HttpMethod,
        body: &Value,
        query: &QueryParams,
    ) -> Result<Value>;
}

impl<T: ShlinkTransport + ?Sized> ShlinkTransport for &T {
    fn get_from_shlink(&self, path: &str, query: &QueryParams) -> Result<Value> {
        (**self).get_from_shlink(path, query)
    }

    fn call_shlink_with_body(
        &self,
        path: &str,
        method: HttpMethod,
        body: &Value,
        query: &QueryParams,
    ) -> Result<Value> {
        (**self).call_shlink_with_body(path, method, body, query)
    }
}

impl<T: ShlinkTransport + ?Sized> ShlinkTransport for Arc<T> {
    fn get_from_shlink(&self, path: &str, query: &QueryParams) -> Result<Value> {
        (**self).get_from_shlink(path, query)
    }

    fn call_shlink_with_body(
        &self,
        path: &str,
        method: HttpMethod,
        body: &Value,
        query: &QueryParams,
    ) -> Result<Value> {
        (**self).call_shlink_with_body(path, method, body, query)
    }
}

/// Performs the network round-trip for an `HttpRequest`.
pub trait RequestExecutor {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Blocking executor backed by a `ureq` agent.
///
/// Status codes are returned as data so `HttpClient` decides what a 4xx or
/// 5xx means.
#[derive(Clone)]
pub struct UreqExecutor {
    agent: ureq::Agent,
}

impl UreqExecutor {
    pub fn new(config: &ShlinkConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_body(
    builder: ureq::RequestBuilder<WithBody>,
    body: Option<&str>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body.as_bytes()),
        None => builder.send_empty(),
    }
}

impl RequestExecutor for UreqExecutor {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let body = body.as_deref();

        let result = match method {
            HttpMethod::Get => with_headers(self.agent.get(&url), &headers).call(),
            HttpMethod::Delete => {
                let builder = with_headers(self.agent.delete(&url), &headers);
                match body {
                    Some(_) => send_body(builder.force_send_body(), body),
                    None => builder.call(),
                }
            }
            HttpMethod::Post => send_body(with_headers(self.agent.post(&url), &headers), body),
            HttpMethod::Put => send_body(with_headers(self.agent.put(&url), &headers), body),
            HttpMethod::Patch => send_body(with_headers(self.agent.patch(&url), &headers), body),
        };
        let mut response = result.map_err(|e| ShlinkError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ShlinkError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// `ShlinkTransport` over a `RequestExecutor`.
#[derive(Debug, Clone)]
pub struct HttpClient<E> {
    config: ShlinkConfig,
    executor: E,
}

impl HttpClient<UreqExecutor> {
    pub fn from_config(config: ShlinkConfig) -> Self {
        let executor = UreqExecutor::new(&config);
        Self::new(config, executor)
    }
}

impl<E: RequestExecutor> HttpClient<E> {
    pub fn new(config: ShlinkConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &ShlinkConfig {
        &self.config
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        query: &QueryParams,
    ) -> Result<HttpRequest> {
        let raw = format!(
            "{}/rest/v{}{}",
            self.config.base_url(),
            self.config.api_version(),
            path
        );
        let mut url = Url::parse(&raw).map_err(|e| ShlinkError::Config(format!("invalid request URL {raw:?}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }

        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("x-api-key".to_string(), self.config.api_key().to_string()),
        ];
        let body = match body {
            Some(body) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(body).map_err(|e| ShlinkError::Serialization(e.to_string()))?)
            }
            None => None,
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Decode a 2xx body (empty → `Null`) or turn anything else into an
    /// `HttpError`.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value> {
        if (200..300).contains(&response.status) {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&response.body).map_err(|e| ShlinkError::Deserialization(e.to_string()));
        }

        let payload = serde_json::from_str(&response.body).unwrap_or(Value::Null);
        let failure = HttpError::from_payload(response.status, &payload);
        warn!(
            status = failure.status(),
            error_type = failure.error_type(),
            detail = failure.detail(),
            "shlink returned an error"
        );
        Err(ShlinkError::Http(failure))
    }

    fn send(&self, method: HttpMethod, path: &str, body: Option<&Value>, query: &QueryParams) -> Result<Value> {
        let request = self.build_request(method, path, body, query)?;
        debug!(method = method.as_str(), url = %request.url, "sending request");
        let response = self.executor.execute(request)?;
        self.parse_response(response)
    }
}

impl<E: RequestExecutor> ShlinkTransport for HttpClient<E> {
    fn get_from_shlink(&self, path: &str, query: &QueryParams) -> Result<Value> {
        self.send(HttpMethod::Get, path, None, query)
    }

    fn call_shlink_with_body(
        &self,
        path: &str,
        method: HttpMethod,
        body: &Value,
        query: &QueryParams,
    ) -> Result<Value> {
        // `Null` means "no body", e.g. for DELETE.
        self.send(method, path, Some(body).filter(|b| !b.is_null()), query)
    }
}
