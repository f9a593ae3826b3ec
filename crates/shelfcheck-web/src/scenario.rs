//! The storefront search flow: home page, search, price filter, grid scrape.

use crate::collector::StopReason;
use crate::config::WebConfig;
use crate::driver::Driver;
use crate::pages::{HomePage, SearchResultsPage};
use crate::product::ProductRecord;
use crate::{Error, Result};
use shelfcheck_support::EvidenceSink;
use tracing::{info, warn};

/// What a successful scenario found.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Products priced above the expected threshold, in scan order.
    pub products: Vec<ProductRecord>,
    pub rounds: u32,
    pub stop: StopReason,
    pub skipped: usize,
    pub degraded_prices: usize,
}

/// One end-to-end search run against a driver.
pub struct SearchScenario<'a> {
    driver: &'a dyn Driver,
    config: &'a WebConfig,
    evidence: &'a dyn EvidenceSink,
}

impl<'a> SearchScenario<'a> {
    pub fn new(
        driver: &'a dyn Driver,
        config: &'a WebConfig,
        evidence: &'a dyn EvidenceSink,
    ) -> Self {
        Self {
            driver,
            config,
            evidence,
        }
    }

    /// Run every step, recording evidence as it goes, then check that
    /// products above the expected price were found.
    pub async fn run(&self) -> Result<ScenarioReport> {
        self.evidence.begin_test(&self.config.name);

        let home = HomePage::new(self.driver, self.config);
        home.go_to_home_page().await?;
        home.validate_header_elements().await?;
        self.capture("home page").await;

        let term = &self.config.site.search_term;
        home.search_for(term).await?;
        self.capture("search submitted").await;
        self.note("search submitted", &format!("search term: {}", term));

        let results = SearchResultsPage::new(self.driver, self.config);
        results.apply_price_filter().await?;
        self.capture("filter applied").await;
        self.note(
            "filter applied",
            &format!("price range: {}", self.config.price_filter.value_literal()),
        );

        results.validate_product_grid_visible().await?;
        let shown = results.validate_products_in_grid().await?;
        self.capture("product grid").await;
        self.note(
            "product grid",
            &format!("{} product card(s) displayed", shown),
        );
        results.validate_price_filter_applied().await?;
        self.capture("price filter applied").await;

        let expected = results.expected_price();
        let collection = results.collect_above_threshold(expected).await?;
        self.capture("filtered products").await;
        self.note("filtered products", &listing(&collection.records, expected));

        check_products(&collection.records, expected)?;
        info!(
            "{} product(s) above R$ {:.2}",
            collection.records.len(),
            expected
        );

        Ok(ScenarioReport {
            products: collection.records,
            rounds: collection.rounds,
            stop: collection.stop,
            skipped: collection.skipped,
            degraded_prices: collection.degraded_prices,
        })
    }

    async fn capture(&self, name: &str) {
        match self.driver.screenshot().await {
            Ok(png) => {
                if let Err(e) = self.evidence.attach_screenshot(name, png) {
                    warn!("Failed to record screenshot '{}': {}", name, e);
                }
            }
            Err(e) => warn!("Failed to take screenshot '{}': {}", name, e),
        }
    }

    fn note(&self, name: &str, text: &str) {
        if let Err(e) = self.evidence.attach_text(name, text) {
            warn!("Failed to record '{}': {}", name, e);
        }
    }
}

fn listing(products: &[ProductRecord], expected: f64) -> String {
    let mut out = format!("Products above R$ {:.2}:\n", expected);
    for product in products {
        out.push_str(&product.to_string());
        out.push('\n');
    }
    out
}

/// At least one product, and every price strictly above `expected`.
fn check_products(products: &[ProductRecord], expected: f64) -> Result<()> {
    if products.is_empty() {
        return Err(Error::AssertionFailed(format!(
            "no products found above R$ {:.2}",
            expected
        )));
    }
    if let Some(p) = products.iter().find(|p| p.price <= expected) {
        return Err(Error::AssertionFailed(format!(
            "product '{}' costs R$ {:.2}, not above R$ {:.2}",
            p.name, p.price, expected
        )));
    }
    Ok(())
}
