//! Event store with file-based JSON persistence
//!
//! Directory layout:
//! ```text
//! <base_dir>/events/
//! ├── evt-<uuid>.json
//! └── ...
//! ```
//!
//! The store is the authoritative guard for the (title, date) uniqueness
//! invariant: `insert` and `save` re-check the key under the write lock and
//! reject a duplicate with `Error::Conflict`, even when a caller's pre-flight
//! check passed moments earlier.

use crate::error::{Error, Result};
use crate::events::query::EventFilter;
use crate::events::types::Event;
use crate::storage;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Predicate accepted by [`EventRepository::find_one`]
pub type EventPredicate<'a> = &'a (dyn Fn(&Event) -> bool + Send + Sync);

/// Persistence collaborator for events
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// First event matching `predicate`, in insertion order
    async fn find_one(&self, predicate: EventPredicate<'_>) -> Result<Option<Event>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>>;

    /// Store a new event; duplicate id or (title, date) is a `Conflict`
    async fn insert(&self, event: Event) -> Result<Event>;

    /// Replace an existing event; duplicate (title, date) is a `Conflict`
    async fn save(&self, event: Event) -> Result<Event>;

    /// Remove an event; `false` when it did not exist
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Events matching `filter`, ordered as documented on the query engine
    async fn query(&self, filter: &EventFilter, radius_meters: f64) -> Result<Vec<Event>>;
}

/// In-memory event store backed by JSON files
pub struct JsonEventStore {
    events_dir: PathBuf,
    events: Arc<RwLock<Vec<Event>>>,
}

impl JsonEventStore {
    /// Open the store at `events_dir`, loading existing events
    pub async fn new(events_dir: PathBuf) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(&events_dir).await?;

        let mut events = storage::load_json_files::<Event>(&events_dir);
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tracing::debug!(count = events.len(), dir = %events_dir.display(), "Loaded events");

        Ok(Self {
            events_dir,
            events: Arc::new(RwLock::new(events)),
        })
    }

    /// Number of stored events
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

fn duplicate_of<'a>(events: &'a [Event], candidate: &Event) -> Option<&'a Event> {
    events
        .iter()
        .find(|e| e.id != candidate.id && e.has_key(&candidate.title, &candidate.date))
}

#[async_trait]
impl EventRepository for JsonEventStore {
    async fn find_one(&self, predicate: EventPredicate<'_>) -> Result<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.iter().find(|&e| predicate(e)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, event: Event) -> Result<Event> {
        let mut events = self.events.write().await;

        if let Some(existing) = events.iter().find(|e| e.id == event.id) {
            return Err(Error::Conflict {
                existing_id: existing.id.clone(),
            });
        }
        if let Some(existing) = duplicate_of(&events, &event) {
            tracing::warn!(
                existing_id = %existing.id,
                "Duplicate (title, date) rejected at storage layer"
            );
            return Err(Error::Conflict {
                existing_id: existing.id.clone(),
            });
        }

        storage::write_json_file(&self.events_dir, &event.id, &event).await?;
        events.push(event.clone());
        Ok(event)
    }

    async fn save(&self, mut event: Event) -> Result<Event> {
        let mut events = self.events.write().await;

        let index = events
            .iter()
            .position(|e| e.id == event.id)
            .ok_or_else(|| Error::NotFound(format!("Event {}", event.id)))?;

        if let Some(existing) = duplicate_of(&events, &event) {
            tracing::warn!(
                existing_id = %existing.id,
                "Duplicate (title, date) rejected at storage layer"
            );
            return Err(Error::Conflict {
                existing_id: existing.id.clone(),
            });
        }

        event.updated_at = chrono::Utc::now();
        storage::write_json_file(&self.events_dir, &event.id, &event).await?;
        events[index] = event.clone();
        Ok(event)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut events = self.events.write().await;

        let Some(index) = events.iter().position(|e| e.id == id) else {
            return Ok(false);
        };

        storage::remove_json_file(&self.events_dir, id).await?;
        events.remove(index);
        Ok(true)
    }

    async fn query(&self, filter: &EventFilter, radius_meters: f64) -> Result<Vec<Event>> {
        let events = self.events.read().await;

        let mut matched: Vec<(f64, &Event)> = events
            .iter()
            .filter_map(|e| filter.evaluate(e, radius_meters).map(|d| (d, e)))
            .collect();

        if filter.near.is_some() {
            // Stable sort keeps insertion order for equal distances
            matched.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        Ok(matched.into_iter().map(|(_, e)| e.clone()).collect())
    }
}
