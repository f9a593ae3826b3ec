use crate::config::Selectors;
use crate::driver::{Driver, ElementHandle};
use crate::price::parse_optional_price;
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// One scraped product card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub name: String,
    /// `0.0` when the price text could not be read.
    pub price: f64,
    /// `"0"` when the card shows no rating.
    pub rating: String,
}

impl ProductRecord {
    pub const NO_RATING: &'static str = "0";

    /// Build a record from raw card text. Only the name is required.
    pub fn from_text(name: &str, price: Option<&str>, rating: Option<&str>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::NotFound("product name is empty".into()));
        }
        let rating = match rating {
            Some(r) => r.trim().to_string(),
            None => {
                warn!("no rating for product: {}", name);
                Self::NO_RATING.to_string()
            }
        };
        Ok(Self {
            name: name.to_string(),
            price: parse_optional_price(price),
            rating,
        })
    }

    /// Whether the price text was understood.
    pub fn has_parsed_price(&self) -> bool {
        self.price != 0.0
    }

    pub fn has_rating(&self) -> bool {
        self.rating != Self::NO_RATING
    }
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "● {} | R$ {:.2} | rating {}", self.name, self.price, self.rating)
    }
}

/// Text of the first `selector` match inside `card`; any failure reads as absent.
async fn optional_text(driver: &dyn Driver, card: &ElementHandle, selector: &str) -> Option<String> {
    let found = match driver.find_elements_in(card, selector).await {
        Ok(found) => found,
        Err(e) => {
            debug!("'{}' unreadable in {}: {}", selector, card, e);
            return None;
        }
    };
    let el = found.first()?;
    match driver.text(el).await {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("'{}' unreadable in {}: {}", selector, card, e);
            None
        }
    }
}

/// Read one product card.
///
/// A missing name fails the card; price and rating degrade to their
/// sentinels instead.
pub async fn build_record(
    driver: &dyn Driver,
    card: &ElementHandle,
    selectors: &Selectors,
) -> Result<ProductRecord> {
    let name_el = driver.find_element_in(card, &selectors.product_name).await?;
    let name = driver.text(&name_el).await?;

    let price = optional_text(driver, card, &selectors.product_price).await;
    debug!("product '{}' price text: {:?}", name.trim(), price);
    let rating = optional_text(driver, card, &selectors.product_rating).await;

    ProductRecord::from_text(&name, price.as_deref(), rating.as_deref())
}
