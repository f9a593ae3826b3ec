//! Scripted in-memory [`Driver`] for unit tests.
//!
//! Selectors match by exact string, so a test adds elements under the same
//! selector strings the code under test queries. Handles are `fake-{index}`.

use crate::config::Selectors;
use crate::driver::{Driver, ElementHandle};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
    pub selector: String,
    pub parent: Option<usize>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub displayed: bool,
    pub enabled: bool,
    pub selected: bool,
    pub removed: bool,
}

impl FakeElement {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            parent: None,
            text: String::new(),
            attrs: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            removed: false,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn inside(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDom {
    elements: Vec<FakeElement>,
    url: String,
    keys: Vec<String>,
    clicked: Vec<String>,
}

impl FakeDom {
    pub fn insert(&mut self, element: FakeElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn element_mut(&mut self, index: usize) -> &mut FakeElement {
        &mut self.elements[index]
    }

    pub fn show(&mut self, index: usize) {
        self.elements[index].displayed = true;
    }

    pub fn remove(&mut self, index: usize) {
        self.elements[index].removed = true;
    }

    /// A product card with optional name, price and rating children.
    pub fn insert_card(
        &mut self,
        name: Option<&str>,
        price: Option<&str>,
        rating: Option<&str>,
    ) -> usize {
        let selectors = Selectors::default();
        let card = self.insert(FakeElement::new(&selectors.product_card));
        let children = [
            (&selectors.product_name, name),
            (&selectors.product_price, price),
            (&selectors.product_rating, rating),
        ];
        for (selector, text) in children {
            if let Some(text) = text {
                self.insert(FakeElement::new(selector).text(text).inside(card));
            }
        }
        card
    }

    fn live(&self, handle: &ElementHandle) -> Result<usize> {
        let index = handle
            .id()
            .strip_prefix("fake-")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|i| *i < self.elements.len())
            .ok_or_else(|| Error::StaleReference(handle.to_string()))?;
        if self.elements[index].removed {
            return Err(Error::StaleReference(handle.to_string()));
        }
        Ok(index)
    }
}

type ClickHook = Box<dyn FnMut(&mut FakeDom) + Send>;
type CallHook = Box<dyn FnOnce(&mut FakeDom) + Send>;

#[derive(Default)]
struct Inner {
    dom: FakeDom,
    calls: HashMap<String, usize>,
    failures: HashMap<String, usize>,
    click_hooks: HashMap<usize, ClickHook>,
    call_hooks: Vec<(String, usize, Option<CallHook>)>,
}

#[derive(Default)]
pub(crate) struct FakeDriver {
    inner: Mutex<Inner>,
}

impl FakeDriver {
    pub fn new() -> Self {
        let driver = Self::default();
        driver.lock().dom.url = "about:blank".into();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn id_of(index: usize) -> String {
        format!("fake-{}", index)
    }

    pub fn handle(&self, index: usize) -> ElementHandle {
        let selector = self.lock().dom.elements[index].selector.clone();
        ElementHandle::new(Self::id_of(index), selector)
    }

    pub fn add(&self, element: FakeElement) -> usize {
        self.lock().dom.insert(element)
    }

    pub fn add_card(&self, name: Option<&str>, price: Option<&str>, rating: Option<&str>) -> usize {
        self.lock().dom.insert_card(name, price, rating)
    }

    pub fn add_load_more(&self) -> usize {
        self.add(FakeElement::new(&Selectors::default().load_more))
    }

    pub fn update(&self, index: usize, f: impl FnOnce(&mut FakeElement)) {
        f(self.lock().dom.element_mut(index));
    }

    /// Run `hook` every time element `index` is clicked.
    pub fn on_click(&self, index: usize, hook: impl FnMut(&mut FakeDom) + Send + 'static) {
        self.lock().click_hooks.insert(index, Box::new(hook));
    }

    /// Run `hook` just before the `n`th call to `op` is served.
    pub fn after_calls(&self, op: &str, n: usize, hook: impl FnOnce(&mut FakeDom) + Send + 'static) {
        self.lock()
            .call_hooks
            .push((op.to_string(), n, Some(Box::new(hook))));
    }

    /// The next `n` calls to `op` fail with a stale reference.
    pub fn fail_next(&self, op: &str, n: usize) {
        self.lock().failures.insert(op.to_string(), n);
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// Live elements registered under `selector`.
    pub fn count(&self, selector: &str) -> usize {
        self.lock()
            .dom
            .elements
            .iter()
            .filter(|e| !e.removed && e.selector == selector)
            .count()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.lock().dom.clicked.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().dom.keys.clone()
    }

    /// Count the call, fire due hooks, then apply scripted failures.
    fn enter(&self, op: &str) -> Result<MutexGuard<'_, Inner>> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let n = {
            let count = inner.calls.entry(op.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        for (hook_op, at, hook) in inner.call_hooks.iter_mut() {
            if hook_op.as_str() == op && *at == n {
                if let Some(hook) = hook.take() {
                    hook(&mut inner.dom);
                }
            }
        }
        if let Some(left) = inner.failures.get_mut(op) {
            if *left > 0 {
                *left -= 1;
                return Err(Error::StaleReference(format!("scripted {} failure", op)));
            }
        }
        Ok(guard)
    }

    fn matching(dom: &FakeDom, selector: &str, parent: Option<usize>) -> Vec<ElementHandle> {
        dom.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.removed && e.selector == selector)
            .filter(|(_, e)| parent.is_none() || e.parent == parent)
            .map(|(i, e)| ElementHandle::new(Self::id_of(i), e.selector.clone()))
            .collect()
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn goto(&self, url: &str) -> Result<()> {
        self.enter("goto")?.dom.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.enter("current_url")?.dom.url.clone())
    }

    async fn title(&self) -> Result<String> {
        self.enter("title")?;
        Ok("Fake".into())
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let inner = self.enter("find_elements")?;
        Ok(Self::matching(&inner.dom, selector, None))
    }

    async fn find_elements_in(
        &self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let inner = self.enter("find_elements_in")?;
        let index = inner.dom.live(parent)?;
        Ok(Self::matching(&inner.dom, selector, Some(index)))
    }

    async fn text(&self, element: &ElementHandle) -> Result<String> {
        let inner = self.enter("text")?;
        let index = inner.dom.live(element)?;
        Ok(inner.dom.elements[index].text.trim().to_string())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let inner = self.enter("attribute")?;
        let index = inner.dom.live(element)?;
        Ok(inner.dom.elements[index].attrs.get(name).cloned())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool> {
        let inner = self.enter("is_displayed")?;
        let index = inner.dom.live(element)?;
        Ok(inner.dom.elements[index].displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool> {
        let inner = self.enter("is_enabled")?;
        let index = inner.dom.live(element)?;
        Ok(inner.dom.elements[index].enabled)
    }

    async fn is_selected(&self, element: &ElementHandle) -> Result<bool> {
        let inner = self.enter("is_selected")?;
        let index = inner.dom.live(element)?;
        Ok(inner.dom.elements[index].selected)
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let mut guard = self.enter("click")?;
        let inner = &mut *guard;
        let index = inner.dom.live(element)?;
        inner.dom.clicked.push(element.id().to_string());
        if let Some(hook) = inner.click_hooks.get_mut(&index) {
            hook(&mut inner.dom);
        }
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> Result<()> {
        let inner = self.enter("scroll_into_view")?;
        inner.dom.live(element)?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str) -> Result<()> {
        let mut inner = self.enter("fill")?;
        let index = inner.dom.live(element)?;
        inner.dom.elements[index]
            .attrs
            .insert("value".into(), value.to_string());
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.enter("press_key")?.dom.keys.push(key.to_string());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.enter("evaluate")?;
        Ok(match script {
            "document.readyState" => serde_json::json!("complete"),
            _ => serde_json::Value::Null,
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.enter("screenshot")?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
