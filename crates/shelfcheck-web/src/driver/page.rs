use super::{Driver, ElementHandle};
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::Page;
use serde::Deserialize;
use tracing::debug;

/// Tags every match with a `data-shelfcheck-id` so later calls can find the
/// same node. Ids carry a per-document prefix, so a handle from a previous
/// page never resolves against the next one.
const FIND_JS: &str = r#"((selector, parentId) => {
    const doc = window.__shelfcheckDoc || (window.__shelfcheckDoc = Math.random().toString(36).slice(2, 10));
    let root = document;
    if (parentId !== null) {
        root = document.querySelector('[data-shelfcheck-id="' + parentId + '"]');
        if (!root || !root.isConnected) return JSON.stringify({ stale: true, ids: [] });
    }
    window.__shelfcheckSeq = window.__shelfcheckSeq || 0;
    const ids = [];
    for (const el of root.querySelectorAll(selector)) {
        if (!el.dataset.shelfcheckId) {
            el.dataset.shelfcheckId = doc + '-' + (++window.__shelfcheckSeq);
        }
        ids.push(el.dataset.shelfcheckId);
    }
    return JSON.stringify({ stale: false, ids });
})"#;

const ELEMENT_JS: &str = r#"((id, op, arg) => {
    const el = document.querySelector('[data-shelfcheck-id="' + id + '"]');
    if (!el || !el.isConnected) return JSON.stringify({ stale: true, value: null });
    let value = null;
    switch (op) {
        case 'text':
            value = (el.innerText || el.textContent || '').trim();
            break;
        case 'attribute':
            value = el.getAttribute(arg);
            break;
        case 'displayed': {
            const style = window.getComputedStyle(el);
            value = el.getClientRects().length > 0
                && style.visibility !== 'hidden'
                && style.display !== 'none';
            break;
        }
        case 'enabled':
            value = !el.disabled;
            break;
        case 'selected':
            value = !!(el.checked || el.selected);
            break;
        case 'scroll':
            el.scrollIntoView({ block: 'center' });
            value = true;
            break;
    }
    return JSON.stringify({ stale: false, value });
})"#;

#[derive(Deserialize)]
struct FindReply {
    stale: bool,
    ids: Vec<String>,
}

#[derive(Deserialize)]
struct ElementReply {
    stale: bool,
    value: serde_json::Value,
}

/// [`Driver`] backed by an eoka page.
pub struct EokaDriver {
    page: Page,
}

impl EokaDriver {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The underlying page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    fn css_for(element: &ElementHandle) -> String {
        format!("[data-shelfcheck-id=\"{}\"]", element.id())
    }

    async fn find(
        &self,
        selector: &str,
        parent: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>> {
        let js = format!(
            "{}({},{})",
            FIND_JS,
            serde_json::to_string(selector)?,
            serde_json::to_string(&parent.map(|p| p.id()))?
        );
        let json: String = self.page.evaluate(&js).await?;
        let reply: FindReply = serde_json::from_str(&json)?;
        if reply.stale {
            let parent = parent.map(|p| p.to_string()).unwrap_or_default();
            return Err(Error::StaleReference(parent));
        }
        debug!("find '{}': {} match(es)", selector, reply.ids.len());
        Ok(reply
            .ids
            .into_iter()
            .map(|id| ElementHandle::new(id, selector))
            .collect())
    }

    async fn element_op(
        &self,
        element: &ElementHandle,
        op: &str,
        arg: Option<&str>,
    ) -> Result<serde_json::Value> {
        let js = format!(
            "{}({},{},{})",
            ELEMENT_JS,
            serde_json::to_string(element.id())?,
            serde_json::to_string(op)?,
            serde_json::to_string(&arg)?
        );
        let json: String = self.page.evaluate(&js).await?;
        let reply: ElementReply = serde_json::from_str(&json)?;
        if reply.stale {
            return Err(Error::StaleReference(element.to_string()));
        }
        Ok(reply.value)
    }

    async fn flag(&self, element: &ElementHandle, op: &str) -> Result<bool> {
        Ok(self
            .element_op(element, op, None)
            .await?
            .as_bool()
            .unwrap_or(false))
    }
}

/// A tagged element the page can no longer find has been re-rendered away.
fn map_missing(element: &ElementHandle, e: eoka::Error) -> Error {
    match e {
        eoka::Error::ElementNotFound(_) => Error::StaleReference(element.to_string()),
        other => Error::Browser(other),
    }
}

#[async_trait]
impl Driver for EokaDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("goto: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.title().await?)
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.find(selector, None).await
    }

    async fn find_elements_in(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        self.find(selector, Some(parent)).await
    }

    async fn text(&self, element: &ElementHandle) -> Result<String> {
        let value = self.element_op(element, "text", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let value = self.element_op(element, "attribute", Some(name)).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        self.flag(element, "displayed").await
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool> {
        self.flag(element, "enabled").await
    }

    async fn is_selected(&self, element: &ElementHandle) -> Result<bool> {
        self.flag(element, "selected").await
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        debug!("click: {}", element);
        self.page
            .click(&Self::css_for(element))
            .await
            .map_err(|e| map_missing(element, e))
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<()> {
        self.element_op(element, "scroll", None).await?;
        self.page.wait(200).await;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> Result<()> {
        debug!("fill: {} = '{}'", element, value);
        self.page
            .fill(&Self::css_for(element), value)
            .await
            .map_err(|e| map_missing(element, e))
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        debug!("press_key: {}", key);
        self.page.human().press_key(key).await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        Ok(self.page.evaluate(script).await?)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.page.screenshot().await?)
    }
}
