//! HTTP plumbing: request/response values, the client capability and the
//! reqwest-backed implementation.

use crate::config::ApiConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Serialized as `application/json`.
    Json(Value),
    /// Sent verbatim with the given content type.
    Raw { content_type: String, text: String },
}

impl Body {
    pub fn content_type(&self) -> &str {
        match self {
            Body::Json(_) => "application/json",
            Body::Raw { content_type, .. } => content_type,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Body::Json(value) => value.to_string(),
            Body::Raw { text, .. } => text.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    pub fn raw(mut self, content_type: impl Into<String>, text: impl Into<String>) -> Self {
        self.body = Some(Body::Raw {
            content_type: content_type.into(),
            text: text.into(),
        });
        self
    }

    /// Header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// The body as JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    pub fn is_json(&self) -> bool {
        self.json().is_ok()
    }

    /// Deserialize the whole body.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Value at a dotted path such as `data.id` or `data.0.email`. Missing
    /// paths, JSON `null` and non-JSON bodies all read as `None`.
    pub fn field(&self, path: &str) -> Option<Value> {
        let root = self.json().ok()?;
        let mut current = &root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!current.is_null()).then(|| current.clone())
    }

    /// Deserialize the value at `path`.
    pub fn field_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self
            .field(path)
            .ok_or_else(|| Error::AssertionFailed(format!("field '{}' not found", path)))?;
        Ok(serde_json::from_value(value)?)
    }

    /// String value at `path`; numbers and booleans are rendered as text.
    pub fn string_field(&self, path: &str) -> Option<String> {
        match self.field(path)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends one request and returns the full response, whatever its status.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`HttpClient`] backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::Request(e.to_string()))?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, body.content_type())
                .body(body.text());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(n, v)| {
                (
                    n.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;
        debug!("{} {} -> {} ({} bytes)", request.method, request.url, status, body.len());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Base URL plus the headers every request built from it carries.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// No credentials at all.
    pub fn base(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            headers: vec![("Accept".into(), "application/json".into())],
        }
    }

    /// Carries the configured API key.
    pub fn with_api_key(config: &ApiConfig) -> Self {
        Self::base(config).header(&config.api_key_header, &config.api_key)
    }

    /// API key plus `Authorization: Bearer` when a token is available.
    pub fn authenticated(config: &ApiConfig, token: Option<&str>) -> Self {
        let spec = Self::with_api_key(config);
        match token {
            Some(token) if !token.is_empty() => {
                spec.header("Authorization", &format!("Bearer {}", token))
            }
            _ => spec,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// A request for `path` (relative to the base URL, may carry a query).
    pub fn request(&self, method: Method, path: &str) -> HttpRequest {
        let mut request = HttpRequest::new(method, format!("{}{}", self.base_url, path));
        request.headers = self.headers.clone();
        request
    }
}
