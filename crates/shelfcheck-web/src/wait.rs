//! Bounded readiness waits and DOM settling.

use crate::driver::{Driver, ElementHandle};
use crate::{Error, Result};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Poll `probe` until it yields a value or `timeout` elapses.
///
/// `NotFound` and `StaleReference` from the probe mean "not yet"; any other
/// error ends the wait immediately.
pub async fn wait_until<T, F, Fut>(
    what: &str,
    timeout: Duration,
    poll: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) if e.is_stale() || e.is_not_found() => {
                debug!("waiting for {}: {}", what, e);
            }
            Err(e) => return Err(e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout(format!(
                "{} not reached within {}ms",
                what,
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

/// How to wait for the page to settle after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SettlePolicy {
    /// Sleep for a fixed time.
    Fixed { ms: u64 },
    /// Wait until the watched element count has changed from the baseline
    /// (or, without one, is non-zero) and then held still for `quiet_ms`,
    /// giving up after `max_ms`.
    Stable { quiet_ms: u64, max_ms: u64 },
}

/// Readiness waits bound to one driver.
#[derive(Clone, Copy)]
pub struct Waits<'a> {
    driver: &'a dyn Driver,
    timeout: Duration,
    poll: Duration,
}

impl<'a> Waits<'a> {
    pub fn new(driver: &'a dyn Driver, timeout: Duration, poll: Duration) -> Self {
        Self {
            driver,
            timeout,
            poll,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `document.readyState == "complete"`.
    pub async fn page_ready(&self) -> Result<()> {
        let driver = self.driver;
        wait_until("page load", self.timeout, self.poll, move || async move {
            let state = driver.evaluate("document.readyState").await?;
            Ok((state.as_str() == Some("complete")).then_some(()))
        })
        .await
    }

    /// First element matching `selector` once it is displayed.
    pub async fn visible(&self, selector: &str) -> Result<ElementHandle> {
        let driver = self.driver;
        let what = format!("'{}' visible", selector);
        wait_until(&what, self.timeout, self.poll, move || async move {
            let el = driver.find_element(selector).await?;
            Ok(driver.is_displayed(&el).await?.then_some(el))
        })
        .await
    }

    /// First element matching `selector` once it is displayed and enabled.
    pub async fn clickable(&self, selector: &str) -> Result<ElementHandle> {
        let driver = self.driver;
        let what = format!("'{}' clickable", selector);
        wait_until(&what, self.timeout, self.poll, move || async move {
            let el = driver.find_element(selector).await?;
            let ready = driver.is_displayed(&el).await? && driver.is_enabled(&el).await?;
            Ok(ready.then_some(el))
        })
        .await
    }

    /// Wait until an already located element is displayed and enabled.
    pub async fn element_clickable(&self, element: &ElementHandle) -> Result<()> {
        let driver = self.driver;
        let what = format!("{} clickable", element);
        wait_until(&what, self.timeout, self.poll, move || async move {
            let ready =
                driver.is_displayed(element).await? && driver.is_enabled(element).await?;
            Ok(ready.then_some(()))
        })
        .await
    }

    /// Apply `policy`, watching the number of elements matching `selector`.
    ///
    /// Never fails on its own account: the stable policy simply returns once
    /// `max_ms` has passed.
    pub async fn settle(
        &self,
        policy: &SettlePolicy,
        selector: &str,
        baseline: Option<usize>,
    ) -> Result<()> {
        let (quiet, max) = match *policy {
            SettlePolicy::Fixed { ms } => {
                debug!("settle: fixed {}ms", ms);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                return Ok(());
            }
            SettlePolicy::Stable { quiet_ms, max_ms } => (
                Duration::from_millis(quiet_ms),
                Duration::from_millis(max_ms),
            ),
        };

        let start = Instant::now();
        let deadline = start + max;
        let mut last = self.driver.find_elements(selector).await?.len();
        let mut changed = baseline.map_or(last > 0, |b| b != last);
        let mut steady_since = start;

        loop {
            let now = Instant::now();
            if changed && now - steady_since >= quiet {
                debug!(
                    "settle: {} '{}' steady after {}ms",
                    last,
                    selector,
                    (now - start).as_millis()
                );
                return Ok(());
            }
            if now >= deadline {
                debug!(
                    "settle: gave up after {}ms with {} '{}'",
                    max.as_millis(),
                    last,
                    selector
                );
                return Ok(());
            }
            tokio::time::sleep(self.poll.min(deadline - now)).await;

            let count = self.driver.find_elements(selector).await?.len();
            if count != last {
                last = count;
                steady_since = Instant::now();
                changed = changed || baseline.map_or(count > 0, |b| b != count);
            }
        }
    }
}
