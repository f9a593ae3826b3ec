use super::{HasDriver, WaitCapable};
use crate::collector::{Collection, Collector};
use crate::config::WebConfig;
use crate::driver::{Driver, ElementHandle};
use crate::filter::{locate_price_filter, FilterMatch};
use crate::product::ProductRecord;
use crate::retry::with_stale_retry;
use crate::wait::Waits;
use crate::{Error, Result};
use tracing::{debug, info};

/// Results grid with its price facet and pagination.
pub struct SearchResultsPage<'a> {
    driver: &'a dyn Driver,
    config: &'a WebConfig,
}

impl HasDriver for SearchResultsPage<'_> {
    fn driver(&self) -> &dyn Driver {
        self.driver
    }

    fn waits(&self) -> Waits<'_> {
        Waits::new(
            self.driver,
            self.config.timing.wait_timeout(),
            self.config.timing.poll(),
        )
    }
}

impl<'a> SearchResultsPage<'a> {
    pub fn new(driver: &'a dyn Driver, config: &'a WebConfig) -> Self {
        Self { driver, config }
    }

    /// The threshold every collected product must exceed.
    pub fn expected_price(&self) -> f64 {
        self.config.price_filter.expected
    }

    async fn card_count(&self) -> Result<usize> {
        Ok(self
            .driver
            .find_elements(&self.config.selectors.product_card)
            .await?
            .len())
    }

    /// Open the price accordion if it is collapsed. Returns whether it was clicked.
    async fn expand_price_accordion(&self) -> Result<bool> {
        let selectors = &self.config.selectors;
        for button in self.driver.find_elements(&selectors.price_accordion).await? {
            if !self
                .driver
                .text(&button)
                .await?
                .contains(&selectors.price_accordion_label)
            {
                continue;
            }
            let collapsed =
                self.driver.attribute(&button, "aria-expanded").await?.as_deref() == Some("false");
            if !collapsed {
                return Ok(false);
            }
            self.driver.scroll_into_view(&button).await?;
            self.driver.click(&button).await?;
            self.waits()
                .settle(&self.config.timing.control_settle, &selectors.product_card, None)
                .await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Reveal every price option. Returns whether "show all" was clicked.
    async fn show_all_filters(&self) -> Result<bool> {
        let selectors = &self.config.selectors;
        let button = self.driver.find_element(&selectors.show_all_filters).await?;
        if !(self.driver.is_displayed(&button).await? && self.driver.is_enabled(&button).await?) {
            return Ok(false);
        }
        self.driver.scroll_into_view(&button).await?;
        self.driver.click(&button).await?;
        self.waits()
            .settle(&self.config.timing.control_settle, &selectors.product_card, None)
            .await?;
        Ok(true)
    }

    /// Locate the checkbox for the configured price range.
    pub async fn locate_price_filter(&self) -> Result<(ElementHandle, FilterMatch)> {
        locate_price_filter(
            self.driver,
            &self.config.selectors.price_filter_inputs,
            &self.config.price_filter,
        )
        .await
    }

    /// Expand the price facet, tick the matching range and wait for the grid
    /// to re-render.
    pub async fn apply_price_filter(&self) -> Result<()> {
        let timing = &self.config.timing;
        let cards = &self.config.selectors.product_card;

        self.wait_page_ready().await?;
        self.waits().settle(&timing.initial_settle, cards, None).await?;

        match self.expand_price_accordion().await {
            Ok(clicked) => debug!("price accordion expanded: {}", clicked),
            Err(e) => debug!("price accordion skipped: {}", e),
        }
        match self.show_all_filters().await {
            Ok(clicked) => debug!("show all filters clicked: {}", clicked),
            Err(e) => debug!("show all filters skipped: {}", e),
        }

        let (checkbox, kind) = self.locate_price_filter().await?;
        self.waits().element_clickable(&checkbox).await?;
        self.driver.scroll_into_view(&checkbox).await?;
        let before = self.card_count().await?;
        self.driver.click(&checkbox).await?;
        info!(
            "Applied price filter {} ({:?})",
            self.config.price_filter.value_literal(),
            kind
        );

        self.wait_page_ready().await?;
        self.waits()
            .settle(&timing.filter_settle, cards, Some(before))
            .await
    }

    /// The filter checkbox must now be ticked.
    pub async fn validate_price_filter_applied(&self) -> Result<()> {
        let (checkbox, _) = self.locate_price_filter().await?;
        if !self.driver.is_selected(&checkbox).await? {
            return Err(Error::AssertionFailed("price filter is not applied".into()));
        }
        Ok(())
    }

    pub async fn validate_product_grid_visible(&self) -> Result<()> {
        self.wait_visible(&self.config.selectors.product_grid).await?;
        Ok(())
    }

    /// At least one product card is rendered. Re-render races are retried;
    /// an empty grid is not.
    pub async fn validate_products_in_grid(&self) -> Result<usize> {
        let driver = self.driver;
        let selector = self.config.selectors.product_card.as_str();
        with_stale_retry(
            &self.config.timing.stale_retry,
            "product grid check",
            move || async move {
                let cards = driver.find_elements(selector).await?;
                let first = cards.first().ok_or_else(|| {
                    Error::AssertionFailed("no products displayed in grid".into())
                })?;
                driver.is_displayed(first).await?;
                Ok(cards.len())
            },
        )
        .await
    }

    /// Scan (and paginate) for products priced above `threshold`.
    pub async fn collect_above_threshold(&self, threshold: f64) -> Result<Collection> {
        Collector::new(
            self.driver,
            &self.config.selectors,
            &self.config.timing,
            self.config.collector,
        )
        .collect_above_threshold(threshold)
        .await
    }

    /// Records priced above `threshold`.
    pub async fn products_above(&self, threshold: f64) -> Result<Vec<ProductRecord>> {
        Ok(self.collect_above_threshold(threshold).await?.records)
    }
}
