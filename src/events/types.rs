//! Event types for the Events API
//!
//! Defines the stored event record, the typed create/update payloads and the
//! paginated response envelope. All types use camelCase JSON serialization.
//! Dates accept RFC 3339 timestamps or plain `YYYY-MM-DD` (midnight UTC).

use crate::geo::GeoPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub location: GeoPoint,
    /// Id of the creating actor
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether this event carries the (title, date) natural key
    pub fn has_key(&self, title: &str, date: &DateTime<Utc>) -> bool {
        self.title == title && self.date == *date
    }
}

/// Request body for creating an event
///
/// Every field is optional at the wire level so that missing fields are
/// reported together as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub date: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

/// Request body for a partial event update
///
/// Absent fields, and empty strings, leave the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub date: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
}

/// Simple `{ "message": ... }` response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Pagination metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{}': expected ISO-8601", s))
}

fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_date(&s).map_err(serde::de::Error::custom))
        .transpose()
}
