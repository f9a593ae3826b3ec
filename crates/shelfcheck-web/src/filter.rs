//! Picking the price-facet checkbox that best matches a numeric range.

use crate::driver::{Driver, ElementHandle};
use crate::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Filter bounds plus the threshold scraped products must exceed.
///
/// `min <= expected` is assumed, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterRange {
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub min: f64,
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub max: f64,
    #[serde(deserialize_with = "shelfcheck_support::de::from_str_or_value")]
    pub expected: f64,
}

impl Default for FilterRange {
    fn default() -> Self {
        Self {
            min: 2500.0,
            max: 5000.0,
            expected: 3500.0,
        }
    }
}

impl FilterRange {
    pub fn new(min: f64, max: f64, expected: f64) -> Self {
        Self { min, max, expected }
    }

    /// The facet value an exact match carries, e.g. `"2500-5000"`.
    pub fn value_literal(&self) -> String {
        format!("{}-{}", self.min, self.max)
    }

    fn covers(&self, low: f64, high: f64) -> bool {
        low <= self.min && high >= self.max
    }
}

/// How a filter control was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMatch {
    /// Value equals `"{min}-{max}"`.
    Exact,
    /// Value mentions both bounds somewhere.
    ContainsBounds,
    /// Value is a `low-high` range enclosing `[min, max]`.
    Superset,
    /// Nothing matched; first control taken.
    Fallback,
}

fn parse_range(value: &str) -> Option<(f64, f64)> {
    let (low, high) = value.split_once('-')?;
    Some((low.trim().parse().ok()?, high.trim().parse().ok()?))
}

/// Choose among candidate values, in document order.
///
/// Each tier scans every candidate before the next tier is tried, and the
/// first hit wins. Returns `None` only for an empty candidate list.
pub fn choose_filter<S: AsRef<str>>(values: &[S], range: &FilterRange) -> Option<(usize, FilterMatch)> {
    if values.is_empty() {
        return None;
    }
    let exact = range.value_literal();
    let (min, max) = (range.min.to_string(), range.max.to_string());

    let tiers: [(FilterMatch, &dyn Fn(&str) -> bool); 3] = [
        (FilterMatch::Exact, &|v| v == exact),
        (FilterMatch::ContainsBounds, &|v| v.contains(&min) && v.contains(&max)),
        (FilterMatch::Superset, &|v| {
            parse_range(v).is_some_and(|(low, high)| range.covers(low, high))
        }),
    ];

    for (kind, matches) in tiers {
        if let Some(i) = values.iter().position(|v| matches(v.as_ref())) {
            return Some((i, kind));
        }
    }
    Some((0, FilterMatch::Fallback))
}

/// Locate the price-facet checkbox for `range` among elements matching
/// `selector`.
pub async fn locate_price_filter(
    driver: &dyn Driver,
    selector: &str,
    range: &FilterRange,
) -> Result<(ElementHandle, FilterMatch)> {
    let candidates = driver.find_elements(selector).await?;
    debug!(
        "looking for price filter {} among {} candidate(s)",
        range.value_literal(),
        candidates.len()
    );

    let mut values = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let value = driver.attribute(candidate, "value").await?.unwrap_or_default();
        debug!("price filter candidate: {}", value);
        values.push(value);
    }

    let Some((index, kind)) = choose_filter(&values, range) else {
        return Err(Error::NotFound("no price filter available".into()));
    };
    match kind {
        FilterMatch::Fallback => warn!(
            "no price filter matches {}; using first available ({})",
            range.value_literal(),
            values[index]
        ),
        _ => info!("price filter {} chosen ({:?})", values[index], kind),
    }
    Ok((candidates[index].clone(), kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, FakeElement};

    fn range() -> FilterRange {
        FilterRange::new(2500.0, 5000.0, 3500.0)
    }

    #[test]
    fn test_value_literal_drops_trailing_zero_fraction() {
        assert_eq!(range().value_literal(), "2500-5000");
        assert_eq!(FilterRange::new(99.9, 200.0, 0.0).value_literal(), "99.9-200");
    }

    #[test]
    fn test_exact_match_wins() {
        let values = ["0-1000", "2000-6000", "2500-5000", "x2500-5000x"];
        assert_eq!(choose_filter(&values, &range()), Some((2, FilterMatch::Exact)));
    }

    #[test]
    fn test_contains_bounds_beats_superset_anywhere() {
        // superset candidate comes first in document order
        let values = ["2000-6000", "2500.00-5000.00"];
        assert_eq!(
            choose_filter(&values, &range()),
            Some((1, FilterMatch::ContainsBounds))
        );
    }

    #[test]
    fn test_superset_takes_first_enclosing_range() {
        let values = ["0-1000", "1000-6000", "2000-9000"];
        assert_eq!(choose_filter(&values, &range()), Some((1, FilterMatch::Superset)));
    }

    #[test]
    fn test_superset_requires_both_bounds() {
        let values = ["3000-6000", "1000-4000", "lots"];
        assert_eq!(choose_filter(&values, &range()), Some((0, FilterMatch::Fallback)));
    }

    #[test]
    fn test_empty_candidates() {
        let values: [&str; 0] = [];
        assert_eq!(choose_filter(&values, &range()), None);
    }

    #[test]
    fn test_choice_is_deterministic() {
        let values = ["0-1000", "1000-6000", "2000-9000", "500-100000"];
        let first = choose_filter(&values, &range());
        for _ in 0..10 {
            assert_eq!(choose_filter(&values, &range()), first);
        }
    }

    #[tokio::test]
    async fn test_locate_on_driver() {
        let driver = FakeDriver::new();
        let sel = "input[type='checkbox']";
        driver.add(FakeElement::new(sel).attr("value", "0-1000"));
        let wanted = driver.add(FakeElement::new(sel).attr("value", "2500-5000"));

        let (handle, kind) = locate_price_filter(&driver, sel, &range()).await.unwrap();
        assert_eq!(kind, FilterMatch::Exact);
        assert_eq!(handle.id(), FakeDriver::id_of(wanted));

        let (again, _) = locate_price_filter(&driver, sel, &range()).await.unwrap();
        assert_eq!(again, handle);
    }

    #[tokio::test]
    async fn test_locate_without_value_attribute_falls_back() {
        let driver = FakeDriver::new();
        let sel = "input[type='checkbox']";
        let first = driver.add(FakeElement::new(sel));
        let (handle, kind) = locate_price_filter(&driver, sel, &range()).await.unwrap();
        assert_eq!(kind, FilterMatch::Fallback);
        assert_eq!(handle.id(), FakeDriver::id_of(first));
    }

    #[tokio::test]
    async fn test_locate_with_no_candidates() {
        let driver = FakeDriver::new();
        let err = locate_price_filter(&driver, "input", &range()).await.unwrap_err();
        if let Error::NotFound(msg) = err {
            assert_eq!(msg, "no price filter available");
        } else {
            panic!("Expected NotFound");
        }
    }
}
