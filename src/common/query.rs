// src/common/query.rs

use std::{fmt::Display, str::FromStr};

use serde::{
    de::{self, value::StrDeserializer, DeserializeOwned, IntoDeserializer},
    Deserialize, Deserializer,
};

// Filtros de query string: `?type=&date_start=` (valor vazio) vale como ausente.
// Use sempre com `#[serde(default, deserialize_with = "...")]`.

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Para tipos serde lidos de string (enums, Uuid, NaiveDate).
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = non_empty(Option::deserialize(deserializer)?) else {
        return Ok(None);
    };
    let inner: StrDeserializer<'_, D::Error> = value.as_str().into_deserializer();
    T::deserialize(inner).map(Some)
}

/// Para tipos com `FromStr` (bool, números).
pub fn parsed_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match non_empty(Option::deserialize(deserializer)?) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}
