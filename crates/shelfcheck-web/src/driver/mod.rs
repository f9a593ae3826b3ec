//! Browser capability consumed by the page objects.
//!
//! Element handles are opaque tokens; a handle whose element was removed by a
//! re-render fails with [`Error::StaleReference`](crate::Error::StaleReference)
//! on next use.

mod page;

pub use page::EokaDriver;

use crate::{Error, Result};
use async_trait::async_trait;

/// Opaque reference to an element located by a [`Driver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
    selector: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selector: selector.into(),
        }
    }

    /// Driver-specific identity of the element.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The selector the element was located with.
    pub fn selector(&self) -> &str {
        &self.selector
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.selector, self.id)
    }
}

/// Everything the storefront checks need from a browser session.
///
/// One driver is owned by one check at a time; implementations need not
/// support concurrent calls against the same page.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// All elements matching `selector`, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Elements matching `selector` inside `parent`, in document order.
    async fn find_elements_in(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>>;

    /// First element matching `selector`.
    async fn find_element(&self, selector: &str) -> Result<ElementHandle> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no element matches '{}'", selector)))
    }

    /// First element matching `selector` inside `parent`.
    async fn find_element_in(&self, parent: &ElementHandle, selector: &str) -> Result<ElementHandle> {
        self.find_elements_in(parent, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no element matches '{}' inside {}",
                    selector, parent
                ))
            })
    }

    /// Visible text, trimmed.
    async fn text(&self, element: &ElementHandle) -> Result<String>;

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool>;

    /// Checked state for checkboxes and radios, selected state for options.
    async fn is_selected(&self, element: &ElementHandle) -> Result<bool>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<()>;

    /// Replace the element's value.
    async fn fill(&self, element: &ElementHandle, value: &str) -> Result<()>;

    /// Press a key on the focused element.
    async fn press_key(&self, key: &str) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// PNG of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
