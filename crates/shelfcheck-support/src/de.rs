//! Serde helpers for config fields that may arrive as substituted text.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueOrText<T> {
    Value(T),
    Text(String),
}

/// Accept either a native YAML scalar or its text form, so `limit: 3500` and
/// `limit: "${limit}"` deserialize alike.
pub fn from_str_or_value<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match ValueOrText::<T>::deserialize(deserializer)? {
        ValueOrText::Value(v) => Ok(v),
        ValueOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid value '{}': {}", s, e))),
    }
}
