//! Structured view of a decoded file.
//!
//! [`DecodedFile`] borrows the header and the reported flights of a
//! [`DecodeSession`](crate::DecodeSession) and maps them field for field.
//! With the `serde` feature it implements `Serialize`; with `json` it can be
//! rendered directly through [`DecodedFile::to_json`].

use crate::{blocks::FileHeader, types::FlightData};

/// Timestamps in the structured view render as `%Y-%m-%d %H:%M:%S`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The header plus every reported flight.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedFile<'a> {
    pub header: &'a FileHeader,
    pub flights: Vec<&'a FlightData>,
}

impl DecodedFile<'_> {
    /// Pretty-printed JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `serde(with = ...)` helpers for optional timestamps.
#[cfg(feature = "serde")]
pub mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.collect_str(&t.format(TIMESTAMP_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(D::Error::custom))
            .transpose()
    }
}
