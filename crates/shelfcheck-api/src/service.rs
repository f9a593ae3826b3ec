//! Typed calls against the users and login endpoints.

use crate::client::{HttpClient, HttpRequest, HttpResponse, Method, RequestSpec};
use crate::config::ApiConfig;
use crate::fixtures;
use crate::model::{Credentials, User};
use crate::Result;
use serde::Serialize;
use shelfcheck_support::EvidenceSink;
use tracing::{debug, info, warn};

/// Sends requests and records their bodies as evidence.
pub struct ApiService<'a> {
    client: &'a dyn HttpClient,
    evidence: &'a dyn EvidenceSink,
}

impl<'a> ApiService<'a> {
    pub fn new(client: &'a dyn HttpClient, evidence: &'a dyn EvidenceSink) -> Self {
        Self { client, evidence }
    }

    fn attach(&self, name: &str, text: &str) {
        if let Err(e) = self.evidence.attach_text(name, text) {
            debug!("could not record {}: {}", name, e);
        }
    }

    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        info!("{} {}", request.method, request.url);
        if let Some(ref body) = request.body {
            self.attach("request body", &body.text());
        }
        let response = self.client.send(request).await?;
        debug!("status {}", response.status);
        self.attach("response body", &response.body);
        Ok(response)
    }

    pub async fn get(&self, spec: &RequestSpec, path: &str) -> Result<HttpResponse> {
        self.send(spec.request(Method::Get, path)).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        spec: &RequestSpec,
        path: &str,
        payload: &T,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_value(payload)?;
        self.send(spec.request(Method::Post, path).json(body)).await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        spec: &RequestSpec,
        path: &str,
        payload: &T,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_value(payload)?;
        self.send(spec.request(Method::Put, path).json(body)).await
    }

    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        spec: &RequestSpec,
        path: &str,
        payload: &T,
    ) -> Result<HttpResponse> {
        let body = serde_json::to_value(payload)?;
        self.send(spec.request(Method::Patch, path).json(body)).await
    }

    pub async fn delete(&self, spec: &RequestSpec, path: &str) -> Result<HttpResponse> {
        self.send(spec.request(Method::Delete, path)).await
    }

    /// Send `text` verbatim with an explicit content type.
    pub async fn send_raw(
        &self,
        spec: &RequestSpec,
        method: Method,
        path: &str,
        content_type: &str,
        text: &str,
    ) -> Result<HttpResponse> {
        self.send(spec.request(method, path).raw(content_type, text))
            .await
    }

    /// Record a failure note alongside the request evidence.
    pub fn attach_error(&self, message: &str) {
        warn!("{}", message);
        self.attach("error message", message);
    }
}

/// User CRUD.
pub struct UserService<'a> {
    api: &'a ApiService<'a>,
    config: &'a ApiConfig,
}

impl<'a> UserService<'a> {
    pub fn new(api: &'a ApiService<'a>, config: &'a ApiConfig) -> Self {
        Self { api, config }
    }

    pub async fn list_users(&self, spec: &RequestSpec, page: u32) -> Result<HttpResponse> {
        let path = format!("{}?page={}", self.config.users_endpoint, page);
        self.api.get(spec, &path).await
    }

    pub async fn get_user(&self, spec: &RequestSpec, id: u64) -> Result<HttpResponse> {
        self.api.get(spec, &self.config.user_endpoint(id)).await
    }

    pub async fn create_user(&self, spec: &RequestSpec, user: &User) -> Result<HttpResponse> {
        self.api.post(spec, &self.config.users_endpoint, user).await
    }

    /// Full update (PUT).
    pub async fn update_user(&self, spec: &RequestSpec, id: u64, user: &User) -> Result<HttpResponse> {
        self.api.put(spec, &self.config.user_endpoint(id), user).await
    }

    /// Partial update (PATCH).
    pub async fn patch_user(&self, spec: &RequestSpec, id: u64, user: &User) -> Result<HttpResponse> {
        self.api.patch(spec, &self.config.user_endpoint(id), user).await
    }

    pub async fn delete_user(&self, spec: &RequestSpec, id: u64) -> Result<HttpResponse> {
        self.api.delete(spec, &self.config.user_endpoint(id)).await
    }
}

/// Login and bearer tokens.
pub struct AuthService<'a> {
    api: &'a ApiService<'a>,
    config: &'a ApiConfig,
}

impl<'a> AuthService<'a> {
    pub fn new(api: &'a ApiService<'a>, config: &'a ApiConfig) -> Self {
        Self { api, config }
    }

    pub async fn login(&self, spec: &RequestSpec, credentials: &Credentials) -> Result<HttpResponse> {
        self.api.post(spec, &self.config.login_endpoint, credentials).await
    }

    /// Log in with the configured account. Any failure is recorded and
    /// yields `None`, so callers carry on without a bearer token.
    pub async fn auth_token(&self) -> Option<String> {
        let spec = RequestSpec::with_api_key(self.config);
        let credentials = fixtures::valid_credentials(self.config);
        let response = match self.login(&spec, &credentials).await {
            Ok(response) => response,
            Err(e) => {
                self.api
                    .attach_error(&format!("could not obtain auth token: {}", e));
                return None;
            }
        };
        if response.status != 200 {
            self.api.attach_error(&format!(
                "authentication failed: status {}",
                response.status
            ));
            return None;
        }
        let token = response.string_field("token").filter(|t| !t.is_empty());
        if token.is_none() {
            self.api.attach_error("authentication response carries no token");
        }
        token
    }
}
