//! Page objects for the storefront.
//!
//! Shared behaviour comes from small capability traits with blanket
//! implementations: anything that can hand out a driver and its waits is
//! [`Navigable`] and [`WaitCapable`].

mod home;
mod search_results;

pub use home::HomePage;
pub use search_results::SearchResultsPage;

use crate::driver::{Driver, ElementHandle};
use crate::wait::Waits;
use crate::Result;
use async_trait::async_trait;
use tracing::info;

/// Access to the browser session a page object drives.
pub trait HasDriver {
    fn driver(&self) -> &dyn Driver;

    fn waits(&self) -> Waits<'_>;
}

/// Moving between pages.
#[async_trait]
pub trait Navigable: HasDriver + Sync {
    /// Open `url` and wait for the document to finish loading.
    async fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);
        self.driver().goto(url).await?;
        self.waits().page_ready().await
    }

    async fn current_url(&self) -> Result<String> {
        self.driver().current_url().await
    }

    async fn title(&self) -> Result<String> {
        self.driver().title().await
    }
}

impl<T: HasDriver + Sync> Navigable for T {}

/// Bounded readiness waits.
#[async_trait]
pub trait WaitCapable: HasDriver + Sync {
    async fn wait_page_ready(&self) -> Result<()> {
        self.waits().page_ready().await
    }

    async fn wait_visible(&self, selector: &str) -> Result<ElementHandle> {
        self.waits().visible(selector).await
    }

    async fn wait_clickable(&self, selector: &str) -> Result<ElementHandle> {
        self.waits().clickable(selector).await
    }
}

impl<T: HasDriver + Sync> WaitCapable for T {}
