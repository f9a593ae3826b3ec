//! Scan the product grid for records above a price threshold, paginating
//! with the grid's "load more" control until enough are found.
//!
//! Records are never de-duplicated: when a page re-renders overlapping cards
//! after "load more", the same product can appear more than once.

use crate::config::{Selectors, TimingConfig};
use crate::driver::Driver;
use crate::product::{build_record, ProductRecord};
use crate::wait::Waits;
use crate::Result;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Pagination budget and stopping point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Stop once this many qualifying records have been collected.
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub satisfaction_target: usize,
    /// Maximum number of grid scans.
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub max_rounds: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            satisfaction_target: 1,
            max_rounds: 3,
        }
    }
}

/// Why collection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Satisfied,
    BudgetExhausted,
    /// No "load more" control, or it was hidden, disabled or unclickable.
    NoMoreResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectState {
    Scanning,
    LoadMore,
    Done(StopReason),
}

/// Outcome of [`Collector::collect_above_threshold`].
#[derive(Debug, Clone)]
pub struct Collection {
    /// Records with `price > threshold`, in scan order.
    pub records: Vec<ProductRecord>,
    /// Grid scans performed.
    pub rounds: u32,
    /// Cards that could not be read at all.
    pub skipped: usize,
    /// Cards whose price text did not parse.
    pub degraded_prices: usize,
    pub stop: StopReason,
}

/// Runs the scan / load-more cycle against one driver.
pub struct Collector<'a> {
    driver: &'a dyn Driver,
    waits: Waits<'a>,
    selectors: &'a Selectors,
    timing: &'a TimingConfig,
    config: CollectorConfig,
}

impl<'a> Collector<'a> {
    pub fn new(
        driver: &'a dyn Driver,
        selectors: &'a Selectors,
        timing: &'a TimingConfig,
        config: CollectorConfig,
    ) -> Self {
        Self {
            driver,
            waits: Waits::new(driver, timing.wait_timeout(), timing.poll()),
            selectors,
            timing,
            config,
        }
    }

    /// Collect every record priced above `threshold`.
    pub async fn collect_above_threshold(&self, threshold: f64) -> Result<Collection> {
        let cards = &self.selectors.product_card;
        self.waits
            .settle(&self.timing.initial_settle, cards, None)
            .await?;

        let mut collection = Collection {
            records: Vec::new(),
            rounds: 0,
            skipped: 0,
            degraded_prices: 0,
            stop: StopReason::NoMoreResults,
        };

        let mut state = CollectState::Scanning;
        loop {
            state = match state {
                CollectState::Scanning => {
                    collection.rounds += 1;
                    self.scan(threshold, &mut collection).await?;
                    let qualifying = collection
                        .records
                        .iter()
                        .filter(|r| r.price > threshold)
                        .count();
                    if qualifying >= self.config.satisfaction_target {
                        CollectState::Done(StopReason::Satisfied)
                    } else if collection.rounds >= self.config.max_rounds {
                        CollectState::Done(StopReason::BudgetExhausted)
                    } else {
                        CollectState::LoadMore
                    }
                }
                CollectState::LoadMore => match self.load_more().await {
                    Ok(true) => CollectState::Scanning,
                    Ok(false) => CollectState::Done(StopReason::NoMoreResults),
                    Err(e) => {
                        debug!("load more unavailable: {}", e);
                        CollectState::Done(StopReason::NoMoreResults)
                    }
                },
                CollectState::Done(reason) => {
                    collection.stop = reason;
                    break;
                }
            };
        }

        info!(
            "Collected {} product(s) above {} in {} round(s) ({:?})",
            collection.records.len(),
            threshold,
            collection.rounds,
            collection.stop
        );
        Ok(collection)
    }

    async fn scan(&self, threshold: f64, collection: &mut Collection) -> Result<()> {
        let cards = self.driver.find_elements(&self.selectors.product_card).await?;
        info!("Round {}: {} product card(s)", collection.rounds, cards.len());

        for (i, card) in cards.iter().enumerate() {
            let record = match build_record(self.driver, card, self.selectors).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping product card {}: {}", i + 1, e);
                    collection.skipped += 1;
                    continue;
                }
            };
            if !record.has_parsed_price() {
                collection.degraded_prices += 1;
            }
            if record.price > threshold {
                debug!("kept: {}", record);
                collection.records.push(record);
            } else {
                debug!("below {}: {}", threshold, record);
            }
        }
        Ok(())
    }

    /// Click "load more" if it is there and usable. `Ok(false)` means there
    /// is nothing more to load.
    async fn load_more(&self) -> Result<bool> {
        let buttons = self.driver.find_elements(&self.selectors.load_more).await?;
        let Some(button) = buttons.first() else {
            debug!("no load more control");
            return Ok(false);
        };
        if !(self.driver.is_displayed(button).await? && self.driver.is_enabled(button).await?) {
            debug!("load more control hidden or disabled");
            return Ok(false);
        }

        let before = self
            .driver
            .find_elements(&self.selectors.product_card)
            .await?
            .len();
        self.driver.scroll_into_view(button).await?;
        self.driver.click(button).await?;
        info!("Loading more products ({} on page)", before);
        self.waits
            .settle(
                &self.timing.load_more_settle,
                &self.selectors.product_card,
                Some(before),
            )
            .await?;
        Ok(true)
    }
}
