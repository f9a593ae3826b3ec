//! Currency text to number.
//!
//! A trailing comma with exactly two digits is a decimal separator
//! (`"R$ 3.456,78"`); otherwise every comma and period is a thousands
//! separator. `"3.456"` therefore reads as `3456`, which is right for
//! Brazilian listings and wrong for a true fractional `3.456`.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Text that holds no readable number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no price in {text:?}")]
pub struct PriceParseError {
    pub text: String,
}

fn decimal_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\d{2}$").expect("decimal comma regex"))
}

/// Parse currency text, reporting failures.
pub fn try_parse_price(text: &str) -> Result<f64, PriceParseError> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = if decimal_comma().is_match(&cleaned) {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.replace(['.', ','], "")
    };

    normalized.parse::<f64>().map_err(|_| PriceParseError {
        text: text.to_string(),
    })
}

/// Parse currency text; unreadable text becomes `0.0` with a warning.
pub fn parse_price(text: &str) -> f64 {
    match try_parse_price(text) {
        Ok(price) => price,
        Err(e) => {
            warn!("{}; using 0.0", e);
            0.0
        }
    }
}

/// [`parse_price`] for text that may be missing altogether.
pub fn parse_optional_price(text: Option<&str>) -> f64 {
    match text {
        Some(text) => parse_price(text),
        None => {
            warn!("no price text; using 0.0");
            0.0
        }
    }
}
