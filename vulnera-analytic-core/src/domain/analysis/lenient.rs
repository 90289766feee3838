//! Tolerant decoding for finding fields
//!
//! Security tools disagree on field types (numeric `line`, integer severity,
//! non-UUID ids). A finding field that does not decode takes its default so
//! the rest of the finding, and the rest of the analysis, still aggregate.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};

/// Either a well-typed value or anything else
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

impl<T> Lenient<T> {
    fn ok(self) -> Option<T> {
        match self {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

/// Any value of type `T`, else `T::default()`
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(Lenient::<T>::deserialize(deserializer)?
        .ok()
        .unwrap_or_default())
}

/// A string, or the textual form of a number or boolean, else empty
pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let scalar = Lenient::<Scalar>::deserialize(deserializer)?.ok();
    Ok(match scalar {
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Integer(number)) => number.to_string(),
        Some(Scalar::Float(number)) => number.to_string(),
        Some(Scalar::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

/// A string parsed with `FromStr`, else `T::default()`
pub(crate) fn parsed<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let raw = Lenient::<Option<String>>::deserialize(deserializer)?
        .ok()
        .flatten();
    Ok(raw.and_then(|value| value.parse().ok()).unwrap_or_default())
}

/// An RFC 3339 timestamp, else the current time
pub(crate) fn timestamp_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Lenient::<DateTime<Utc>>::deserialize(deserializer)?
        .ok()
        .unwrap_or_else(Utc::now))
}

/// Every item that decodes as `T`; the others are skipped with a warning
pub(crate) fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Lenient::<Vec<Lenient<T>>>::deserialize(deserializer)?
        .ok()
        .unwrap_or_default();

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let decoded = item.ok();
            if decoded.is_none() {
                tracing::warn!(index, "Skipping finding that is not an object");
            }
            decoded
        })
        .collect())
}
