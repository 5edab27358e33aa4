//! Event query engine
//!
//! Filters compose conjunctively:
//! - `category`: exact, case-sensitive match
//! - `near`: within a fixed radius (meters, spherical Earth) of a point
//!
//! Ordering: with `near`, ascending distance from the point (ties keep
//! insertion order); without it, insertion order.

use crate::error::{Error, Result};
use crate::events::store::EventRepository;
use crate::events::types::{Event, PaginatedResponse, Pagination};
use crate::geo::GeoPoint;
use std::sync::Arc;

/// Parsed, validated search filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub category: Option<String>,
    pub near: Option<GeoPoint>,
}

impl EventFilter {
    /// Build a filter from raw query-string values.
    ///
    /// Coordinates must both be present, numeric, finite and in range;
    /// anything else is an `InvalidFilter`, never a silent (0, 0).
    pub fn from_params(
        category: Option<&str>,
        longitude: Option<&str>,
        latitude: Option<&str>,
    ) -> Result<Self> {
        let category = category.filter(|c| !c.is_empty()).map(str::to_string);

        let near = match (non_blank(longitude), non_blank(latitude)) {
            (None, None) => None,
            (Some(lng), Some(lat)) => {
                let lng = parse_coordinate("longitude", lng)?;
                let lat = parse_coordinate("latitude", lat)?;
                Some(GeoPoint::try_new(lng, lat).map_err(Error::InvalidFilter)?)
            }
            (Some(_), None) => {
                return Err(Error::InvalidFilter(
                    "latitude is required with longitude".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(Error::InvalidFilter(
                    "longitude is required with latitude".to_string(),
                ))
            }
        };

        Ok(Self { category, near })
    }

    /// Filter on category only
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            near: None,
        }
    }

    /// Filter on proximity only
    pub fn near(point: GeoPoint) -> Self {
        Self {
            category: None,
            near: Some(point),
        }
    }

    /// Evaluate the filter against one event.
    ///
    /// Returns `None` when the event is excluded, otherwise the distance
    /// from the `near` point (0 without one).
    pub fn evaluate(&self, event: &Event, radius_meters: f64) -> Option<f64> {
        if let Some(category) = &self.category {
            if &event.category != category {
                return None;
            }
        }
        match &self.near {
            Some(point) => {
                let distance = point.distance_meters(&event.location);
                (distance <= radius_meters).then_some(distance)
            }
            None => Some(0.0),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_coordinate(name: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| Error::InvalidFilter(format!("{} '{}' is not a number", name, raw)))
}

/// Finite result set of a search; iterate it as many times as needed
#[derive(Debug, Clone, Default)]
pub struct EventSequence {
    events: Vec<Event>,
}

impl EventSequence {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Slice out one 1-based page
    pub fn page(&self, page: u64, per_page: u64) -> PaginatedResponse<Event> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = self.events.len() as u64;
        let total_pages = total.div_ceil(per_page);

        // Offsets past the end, including ones that overflow, yield no data
        let data = match (page - 1).checked_mul(per_page) {
            Some(start) if start < total => self
                .events
                .iter()
                .skip(start as usize)
                .take(usize::try_from(per_page).unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };

        PaginatedResponse {
            data,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        }
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl IntoIterator for EventSequence {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Runs filtered searches against the event repository
pub struct QueryEngine {
    repo: Arc<dyn EventRepository>,
    radius_meters: f64,
}

impl QueryEngine {
    pub fn new(repo: Arc<dyn EventRepository>, radius_meters: f64) -> Self {
        Self {
            repo,
            radius_meters,
        }
    }

    /// Radius applied to `near` filters, in meters
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Execute a search
    pub async fn search(&self, filter: &EventFilter) -> Result<EventSequence> {
        let events = self.repo.query(filter, self.radius_meters).await?;
        tracing::debug!(
            category = ?filter.category,
            near = ?filter.near,
            matched = events.len(),
            "Event search"
        );
        Ok(EventSequence::new(events))
    }
}
