//! Duplicate (title, date) detection
//!
//! A pre-flight check only. It does not lock anything, so two concurrent
//! creators of the same (title, date) can both pass it; the store re-checks
//! the key under its write lock and the loser gets `Conflict` from there.

use crate::error::Result;
use crate::events::store::EventRepository;
use crate::events::types::Event;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Looks up events sharing a (title, date) natural key
pub struct DuplicateDetector {
    repo: Arc<dyn EventRepository>,
}

impl DuplicateDetector {
    pub fn new(repo: Arc<dyn EventRepository>) -> Self {
        Self { repo }
    }

    /// Id of an event other than `exclude_id` with the same (title, date)
    pub async fn check(
        &self,
        title: &str,
        date: &DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<Option<String>> {
        let title = title.trim();
        let predicate = |e: &Event| Some(e.id.as_str()) != exclude_id && e.has_key(title, date);
        let found = self.repo.find_one(&predicate).await?;
        Ok(found.map(|e| e.id))
    }
}
