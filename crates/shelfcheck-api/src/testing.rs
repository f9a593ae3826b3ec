//! In-memory [`HttpClient`] for unit tests, plus a small stand-in for the
//! reqres server.

use crate::client::{Body, HttpClient, HttpRequest, HttpResponse, Method};
use crate::config::ApiConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

pub(crate) const MOCK_BASE: &str = "http://mock/api";
const TOKEN: &str = "QpwL5tke4Pnpja7X4";

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync>;

pub(crate) struct MockClient {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockClient {
    pub fn new(handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(move |r| Ok(handler(r))),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails before reaching a server.
    pub fn failing(error: impl Fn(&HttpRequest) -> Error + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(move |r| Err(error(r))),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Default config pointed at the mock base URL.
    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            base_url: MOCK_BASE.into(),
            ..ApiConfig::default()
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}

fn reply(status: u16, body: Value) -> HttpResponse {
    let mut response = HttpResponse::new(status, body.to_string());
    response
        .headers
        .push(("Content-Type".into(), "application/json".into()));
    response
}

fn user(id: u64) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@reqres.in", id),
        "first_name": format!("First{}", id),
        "last_name": format!("Last{}", id),
        "avatar": format!("https://reqres.in/img/faces/{}-image.jpg", id)
    })
}

fn request_json(request: &HttpRequest) -> Option<Value> {
    match request.body.as_ref()? {
        Body::Json(value) => Some(value.clone()),
        Body::Raw { content_type, text } if content_type.contains("form-urlencoded") => {
            let map = text
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect();
            Some(Value::Object(map))
        }
        Body::Raw { text, .. } => serde_json::from_str(text).ok(),
    }
}

fn echo(request: &HttpRequest, stamp: &str, extra: Option<(&str, Value)>) -> Value {
    let mut body = request_json(request).unwrap_or_else(|| json!({}));
    if let Value::Object(ref mut map) = body {
        map.insert(stamp.into(), json!("2024-05-01T10:00:00.000Z"));
        if let Some((k, v)) = extra {
            map.insert(k.into(), v);
        }
    }
    body
}

fn login(request: &HttpRequest) -> HttpResponse {
    let Some(body) = request_json(request) else {
        return reply(400, json!({"error": "Bad Request"}));
    };
    let text = |k: &str| body.get(k).and_then(Value::as_str).unwrap_or("").to_string();
    let (email, password) = (text("email"), text("password"));
    if email.is_empty() {
        reply(400, json!({"error": "Missing email or username"}))
    } else if password.is_empty() {
        reply(400, json!({"error": "Missing password"}))
    } else if email != ApiConfig::default().auth.email {
        reply(400, json!({"error": "user not found"}))
    } else {
        reply(200, json!({"token": TOKEN}))
    }
}

/// Behaves like reqres.in for the endpoints the suite touches, including its
/// habit of accepting any password for a known account.
pub(crate) fn reqres(request: &HttpRequest) -> HttpResponse {
    match request.header_value("X-API-KEY") {
        None => {
            return reply(
                401,
                json!({"error": "Missing API key", "how_to_get_one": "https://reqres.in/signup"}),
            )
        }
        Some(key) if key != ApiConfig::default().api_key => {
            return reply(403, json!({"error": "Invalid API key"}))
        }
        Some(_) => {}
    }

    let path = request.url.strip_prefix(MOCK_BASE).unwrap_or(&request.url);
    let (path, query) = path.split_once('?').unwrap_or((path, ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (request.method, segments.as_slice()) {
        (Method::Get, ["users"]) => {
            let page: u32 = query
                .strip_prefix("page=")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1);
            let first = u64::from(page - 1) * 6 + 1;
            reply(
                200,
                json!({
                    "page": page, "per_page": 6, "total": 12, "total_pages": 2,
                    "data": (first..first + 6).map(user).collect::<Vec<_>>(),
                    "support": {"url": "https://reqres.in/#support-heading", "text": "Thanks!"}
                }),
            )
        }
        (Method::Get, ["users", id]) => match id.parse::<u64>() {
            Ok(id) if id <= 12 => reply(200, json!({"data": user(id)})),
            _ => reply(404, json!({})),
        },
        (Method::Post, ["users"]) => reply(201, echo(request, "createdAt", Some(("id", json!("123"))))),
        (Method::Put | Method::Patch, ["users", _]) => reply(200, echo(request, "updatedAt", None)),
        (Method::Delete, ["users", _]) => HttpResponse::new(204, ""),
        (Method::Post, ["login"]) => login(request),
        (_, ["login"]) => reply(405, json!({"error": "Method Not Allowed"})),
        _ => reply(404, json!({})),
    }
}
