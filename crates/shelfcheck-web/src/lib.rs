//! # shelfcheck-web
//!
//! Storefront checks driven through a real browser: search for a term, apply
//! a price-range filter, then scrape the product grid for items above a price
//! threshold, paginating with the grid's "load more" control when needed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shelfcheck_support::MemorySink;
//! use shelfcheck_web::{Runner, WebConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> shelfcheck_web::Result<()> {
//! let config = WebConfig::load("configs/smart-tv.yaml")?;
//! let evidence = MemorySink::new();
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config, &evidence).await?;
//! println!("Success: {}", result.success);
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Everything above the [`Driver`] trait is browser-agnostic; [`EokaDriver`]
//! is the production implementation.

pub mod collector;
mod config;
pub mod driver;
pub mod filter;
pub mod pages;
pub mod price;
pub mod product;
pub mod retry;
mod runner;
mod scenario;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use collector::{Collection, Collector, CollectorConfig, StopReason};
pub use config::{
    BrowserConfig, EvidenceConfig, OnFailure, ParamDef, Params, Selectors, SiteConfig,
    TimingConfig, Viewport, WebConfig,
};
pub use driver::{Driver, ElementHandle, EokaDriver};
pub use filter::{FilterMatch, FilterRange};
pub use pages::{HasDriver, HomePage, Navigable, SearchResultsPage, WaitCapable};
pub use price::{parse_price, try_parse_price, PriceParseError};
pub use product::ProductRecord;
pub use retry::{with_stale_retry, RetryBudget};
pub use runner::{RunResult, Runner};
pub use scenario::{ScenarioReport, SearchScenario};
pub use wait::{SettlePolicy, Waits};

/// Result type for shelfcheck-web operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a config or driving the storefront.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error(transparent)]
    Support(#[from] shelfcheck_support::Error),

    /// No candidate element exists at all.
    #[error("not found: {0}")]
    NotFound(String),

    /// A handle no longer points at live DOM content.
    #[error("stale element reference: {0}")]
    StaleReference(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

impl Error {
    /// Transient re-render races that are worth retrying.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::StaleReference(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
