//! # shelfcheck-api
//!
//! User CRUD and authentication checks against a reqres-style REST API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shelfcheck_api::{ApiConfig, ApiSuite, ReqwestClient};
//! use shelfcheck_support::MemorySink;
//!
//! # #[tokio::main]
//! # async fn main() -> shelfcheck_api::Result<()> {
//! let config = ApiConfig::load("configs/reqres.yaml")?;
//! let client = ReqwestClient::new(config.timeout())?;
//! let evidence = MemorySink::new();
//! let report = ApiSuite::new(&client, &config, &evidence).run().await;
//! println!("{}/{} passed", report.passed(), report.results.len());
//! # Ok(())
//! # }
//! ```
//!
//! Everything talks to the network through [`HttpClient`]; [`ReqwestClient`]
//! is the production implementation.

pub mod assertions;
pub mod client;
mod config;
pub mod fixtures;
pub mod model;
pub mod service;
mod suite;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Body, HttpClient, HttpRequest, HttpResponse, Method, ReqwestClient, RequestSpec};
pub use config::{ApiConfig, AuthConfig, EvidenceConfig};
pub use model::{Credentials, Support, User, UserListResponse};
pub use service::{ApiService, AuthService, UserService};
pub use suite::{ApiSuite, Case, CaseResult, SuiteReport};
pub use validate::ErrorKind;

/// Result type for shelfcheck-api operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a config or exercising the API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Support(#[from] shelfcheck_support::Error),

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}
