use super::{HasDriver, Navigable, WaitCapable};
use crate::config::WebConfig;
use crate::driver::Driver;
use crate::wait::Waits;
use crate::Result;
use tracing::{debug, info};

/// Storefront landing page: header, search box.
pub struct HomePage<'a> {
    driver: &'a dyn Driver,
    config: &'a WebConfig,
}

impl HasDriver for HomePage<'_> {
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

impl<'a> HomePage<'a> {
    pub fn new(driver: &'a dyn Driver, config: &'a WebConfig) -> Self {
        Self { driver, config }
    }

    pub async fn go_to_home_page(&self) -> Result<()> {
        self.navigate(&self.config.site.base_url).await
    }

    /// Type `term` into the search box and submit with Enter.
    pub async fn search_for(&self, term: &str) -> Result<()> {
        let input = self
            .wait_clickable(&self.config.selectors.search_input)
            .await?;
        self.driver.fill(&input, term).await?;
        self.driver.press_key("Enter").await?;
        info!("Searched for: {}", term);
        Ok(())
    }

    /// Every header element must become visible.
    pub async fn validate_header_elements(&self) -> Result<()> {
        for (label, selector) in self.config.selectors.header_elements() {
            self.wait_visible(selector).await?;
            debug!("header element visible: {}", label);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, FakeElement};
    use crate::Error;

    fn config() -> WebConfig {
        WebConfig::parse("name: \"home\"\n").unwrap()
    }

    fn add_header(driver: &FakeDriver, config: &WebConfig) {
        for (_, selector) in config.selectors.header_elements() {
            driver.add(FakeElement::new(selector));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_home_page() {
        let driver = FakeDriver::new();
        let config = config();
        let home = HomePage::new(&driver, &config);
        home.go_to_home_page().await.unwrap();
        assert_eq!(
            home.current_url().await.unwrap(),
            "https://www.americanas.com.br/"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_for_fills_and_submits() {
        let driver = FakeDriver::new();
        let config = config();
        add_header(&driver, &config);
        let home = HomePage::new(&driver, &config);

        home.search_for("Smart TV").await.unwrap();

        let input = driver.find_element(&config.selectors.search_input).await.unwrap();
        assert_eq!(
            driver.attribute(&input, "value").await.unwrap(),
            Some("Smart TV".to_string())
        );
        assert_eq!(driver.keys(), vec!["Enter".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_header_elements() {
        let driver = FakeDriver::new();
        let config = config();
        add_header(&driver, &config);
        let home = HomePage::new(&driver, &config);
        home.validate_header_elements().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_cart_button_times_out() {
        let driver = FakeDriver::new();
        let config = config();
        for (label, selector) in config.selectors.header_elements() {
            if label != "cart button" {
                driver.add(FakeElement::new(selector));
            }
        }
        let home = HomePage::new(&driver, &config);
        let err = home.validate_header_elements().await.unwrap_err();
        if let Error::Timeout(msg) = err {
            assert!(msg.contains("cart-toggle"));
        } else {
            panic!("Expected Timeout");
        }
    }
}
