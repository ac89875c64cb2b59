//! Record identifiers.
//!
//! Every id is a positive `u64`. Route parameters are parsed with [`parse_id`]
//! before they reach a store, and persisted ids written as numeric strings
//! (`"3"`) are accepted on read through [`lenient_id`].

use serde::{Deserialize, Deserializer};

/// Parse a raw path segment into a record id. Zero, negatives and non-numeric
/// input are rejected.
pub fn parse_id(raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(id),
    }
}

/// Serde helper accepting either `3` or `"3"` for an id field.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid id: {n}"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {s:?}"))),
        _ => Err(serde::de::Error::custom("expected number or string id")),
    }
}
