//! The `deals` table row

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Table the listings are read from
pub const DEALS_TABLE: &str = "deals";

/// A single investment opportunity exposed to the public
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Opaque unique identifier
    #[serde(rename = "uuid")]
    pub id: String,
    #[serde(rename = "deal_name")]
    pub name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Free-form category label
    pub deal_type: Option<String>,
    pub needs: Option<String>,
    /// Numeric string or free text
    pub asking: Option<String>,
    #[serde(rename = "public_status")]
    pub is_public: bool,
    pub public_info: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// Accepts `timestamptz` output (`+00:00` or `+00` offsets) as well as
/// `timestamp` columns without an offset, which are read as UTC.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", text)))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}
