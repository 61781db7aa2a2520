//! Lenient timestamp (de)serialization for remote-owned date fields.
//!
//! The remote API renders `DATETIME` columns through its JSON encoder, which
//! yields RFC 2822 (`Tue, 14 Jan 2025 10:30:00 GMT`). Local fixtures and newer
//! deployments use RFC 3339, and raw SQL strings (`2025-01-14 10:30:00`) show
//! up too. All three are accepted; values are written back as RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a remote timestamp in any of the accepted formats.
#[must_use]
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// `#[serde(with = ...)]` adapter for `Option<DateTime<Utc>>` fields.
pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as an RFC 3339 string, or `null`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from any accepted format, or `null`.
    ///
    /// # Errors
    ///
    /// Returns an error for strings that match none of the accepted formats.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {s}"))),
        }
    }
}
