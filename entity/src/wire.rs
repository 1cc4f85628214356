//! Helpers shared by the `*Record` wire structs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::stage::UnknownStage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum WireError {
    #[error("record is missing {0}")]
    MissingField(&'static str),
    #[error("invalid record id {0:?}")]
    InvalidId(String),
    #[error("{field} is not a valid amount: {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error(transparent)]
    Stage(#[from] UnknownStage),
}

/// Largest amount a record may carry: one hundred billion dollars, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// The record service speaks dollars as floats; records keep integer cents.
pub fn dollars_to_cents(field: &'static str, value: f64) -> Result<i64, WireError> {
    let cents = (value * 100.0).round();
    if !cents.is_finite() || cents.abs() > MAX_AMOUNT_CENTS as f64 {
        return Err(WireError::InvalidAmount { field, value });
    }
    Ok(cents as i64)
}

pub fn cents_to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// `#[serde(with = "dollars")]` for cent fields carried as dollar floats.
pub mod dollars {
    use super::*;

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(cents_to_dollars(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?.unwrap_or_default();
        dollars_to_cents("amount", value).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            cents: &Option<i64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match cents {
                Some(cents) => serializer.serialize_some(&cents_to_dollars(*cents)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<i64>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|value| dollars_to_cents("amount", value).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Patch fields that may be cleared: absent is `None`, explicit null is
/// `Some(None)`. Pair with `default` and `skip_serializing_if`.
pub mod double_option {
    use super::*;

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

pub(crate) fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
