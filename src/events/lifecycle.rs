//! Event lifecycle manager
//!
//! Orchestrates create / update / delete:
//!
//! ```text
//! create: validate → duplicate check → insert → notify(created)
//! update: load → ownership → validate patch → duplicate check (if key moves) → save → notify(updated)
//! delete: load → ownership → remove → notify(deleted)
//! ```
//!
//! Per event the states are `Absent → Created → Updated* → Deleted`. Deleted
//! is terminal; ids are fresh UUIDs so nothing is ever resurrected.
//!
//! Notifications are best-effort. A notifier failure is logged by the
//! dispatcher and never changes the outcome returned here.

use crate::error::{Error, Result};
use crate::events::duplicate::DuplicateDetector;
use crate::events::ownership::OwnershipGuard;
use crate::events::store::EventRepository;
use crate::events::types::{CreateEventRequest, Event, UpdateEventRequest};
use crate::identity::Actor;
use crate::notify::{LifecycleKind, NotificationDispatcher};
use std::sync::Arc;

/// Orchestrates event mutations
pub struct EventLifecycle {
    repo: Arc<dyn EventRepository>,
    duplicates: DuplicateDetector,
    guard: OwnershipGuard,
    notifications: NotificationDispatcher,
}

/// Treat empty strings like absent fields
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl EventLifecycle {
    pub fn new(
        repo: Arc<dyn EventRepository>,
        guard: OwnershipGuard,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            duplicates: DuplicateDetector::new(repo.clone()),
            repo,
            guard,
            notifications,
        }
    }

    /// Fetch a single event
    pub async fn get(&self, id: &str) -> Result<Event> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Event {}", id)))
    }

    /// Create an event owned by `actor`
    pub async fn create(&self, actor: &Actor, req: CreateEventRequest) -> Result<Event> {
        let title = req.title.as_deref().map(str::trim).unwrap_or_default();
        let description = present(req.description);
        let category = present(req.category);

        let mut invalid = Vec::new();
        if title.is_empty() {
            invalid.push("title: must not be empty".to_string());
        }
        if description.is_none() {
            invalid.push("description: missing".to_string());
        }
        if category.is_none() {
            invalid.push("category: missing".to_string());
        }
        if req.date.is_none() {
            invalid.push("date: missing".to_string());
        }
        match &req.location {
            None => invalid.push("location: missing".to_string()),
            Some(point) => {
                if let Err(e) = point.validate() {
                    invalid.push(format!("location: {}", e));
                }
            }
        }

        let (Some(description), Some(category), Some(date), Some(location), true) =
            (description, category, req.date, req.location, invalid.is_empty())
        else {
            return Err(Error::Validation(invalid));
        };

        if let Some(existing_id) = self.duplicates.check(title, &date, None).await? {
            return Err(Error::Conflict { existing_id });
        }

        let now = chrono::Utc::now();
        let event = Event {
            id: format!("evt-{}", uuid::Uuid::new_v4()),
            title: title.to_string(),
            description,
            category,
            date,
            location,
            owner: actor.id.clone(),
            created_at: now,
            updated_at: now,
        };

        // The store re-checks the key; losing a race also yields Conflict
        let event = self.repo.insert(event).await?;
        tracing::info!(event_id = %event.id, actor_id = %actor.id, "Event created");

        self.notifications
            .dispatch(LifecycleKind::Created, &actor.email, &event);
        Ok(event)
    }

    /// Apply a partial update to an event the actor may mutate
    pub async fn update(
        &self,
        actor: &Actor,
        event_id: &str,
        patch: UpdateEventRequest,
    ) -> Result<Event> {
        let current = self.repo.find_by_id(event_id).await?;
        let current = self
            .guard
            .enforce(actor, current.as_ref(), event_id, "update")?;

        let title = present(patch.title);
        let mut invalid = Vec::new();
        if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            invalid.push("title: must not be empty".to_string());
        }
        if let Some(point) = &patch.location {
            if let Err(e) = point.validate() {
                invalid.push(format!("location: {}", e));
            }
        }
        if !invalid.is_empty() {
            return Err(Error::Validation(invalid));
        }

        let mut updated = current.clone();
        if let Some(title) = title {
            updated.title = title.trim().to_string();
        }
        if let Some(description) = present(patch.description) {
            updated.description = description;
        }
        if let Some(category) = present(patch.category) {
            updated.category = category;
        }
        if let Some(date) = patch.date {
            updated.date = date;
        }
        if let Some(location) = patch.location {
            updated.location = location;
        }

        if !updated.has_key(&current.title, &current.date) {
            if let Some(existing_id) = self
                .duplicates
                .check(&updated.title, &updated.date, Some(event_id))
                .await?
            {
                return Err(Error::Conflict { existing_id });
            }
        }

        let event = self.repo.save(updated).await?;
        tracing::info!(event_id = %event.id, actor_id = %actor.id, "Event updated");

        self.notifications
            .dispatch(LifecycleKind::Updated, &actor.email, &event);
        Ok(event)
    }

    /// Delete an event the actor may mutate
    pub async fn delete(&self, actor: &Actor, event_id: &str) -> Result<()> {
        let current = self.repo.find_by_id(event_id).await?;
        let event = self
            .guard
            .enforce(actor, current.as_ref(), event_id, "delete")?;

        // A concurrent delete may have won since the lookup
        if !self.repo.delete(event_id).await? {
            return Err(Error::NotFound(format!("Event {}", event_id)));
        }
        tracing::info!(event_id = %event_id, actor_id = %actor.id, "Event deleted");

        self.notifications
            .dispatch(LifecycleKind::Deleted, &actor.email, event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::query::{EventFilter, QueryEngine};
    use crate::events::store::JsonEventStore;
    use crate::events::types::parse_date;
    use crate::geo::GeoPoint;
    use crate::identity::Role;
    use crate::notify::dispatcher::testing::{FailingNotifier, RecordingNotifier};
    use crate::notify::Localizer;
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        lifecycle: EventLifecycle,
        query: QueryEngine,
        _dir: TempDir,
    }

    async fn harness_with(
        guard: OwnershipGuard,
        notifications: NotificationDispatcher,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonEventStore::new(dir.path().join("events")).await.unwrap());
        Harness {
            lifecycle: EventLifecycle::new(store.clone(), guard, notifications),
            query: QueryEngine::new(store, 50_000.0),
            _dir: dir,
        }
    }

    async fn harness() -> Harness {
        harness_with(OwnershipGuard::default(), NotificationDispatcher::disabled()).await
    }

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            role,
        }
    }

    fn gig() -> CreateEventRequest {
        CreateEventRequest {
            title: Some("Gig".to_string()),
            description: Some("Live set".to_string()),
            category: Some("music".to_string()),
            date: Some(parse_date("2025-06-01").unwrap()),
            location: Some(GeoPoint::new(0.0, 0.0)),
        }
    }

    #[tokio::test]
    async fn test_create_then_search() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);

        let event = h.lifecycle.create(&x, gig()).await.unwrap();
        assert!(event.id.starts_with("evt-"));
        assert_eq!(event.owner, "usr-x");

        let results = h.query.search(&EventFilter::default()).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.iter().next().unwrap().id, event.id);
    }

    #[tokio::test]
    async fn test_create_validation_lists_all_fields() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);

        let err = h
            .lifecycle
            .create(&x, CreateEventRequest::default())
            .await
            .unwrap_err();
        match err {
            Error::Validation(fields) => {
                assert_eq!(fields.len(), 5);
                assert!(fields.iter().any(|f| f.starts_with("title")));
                assert!(fields.iter().any(|f| f.starts_with("location")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_and_bad_location() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);

        let mut req = gig();
        req.title = Some("   ".to_string());
        req.location = Some(GeoPoint::new(0.0, 95.0));
        let err = h.lifecycle.create(&x, req).await.unwrap_err();
        match err {
            Error::Validation(fields) => assert_eq!(fields.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_trims_title() {
        let h = harness().await;
        let mut req = gig();
        req.title = Some("  Gig  ".to_string());
        let event = h
            .lifecycle
            .create(&actor("usr-x", Role::User), req)
            .await
            .unwrap();
        assert_eq!(event.title, "Gig");
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let y = actor("usr-y", Role::User);

        let first = h.lifecycle.create(&x, gig()).await.unwrap();
        let err = h.lifecycle.create(&y, gig()).await.unwrap_err();
        match err {
            Error::Conflict { existing_id } => assert_eq!(existing_id, first.id),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gig_scenario_move_date_then_recreate() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);

        let a = h.lifecycle.create(&x, gig()).await.unwrap();
        assert!(matches!(
            h.lifecycle.create(&x, gig()).await,
            Err(Error::Conflict { .. })
        ));

        let patch = UpdateEventRequest {
            date: Some(parse_date("2025-06-02").unwrap()),
            ..Default::default()
        };
        h.lifecycle.update(&x, &a.id, patch).await.unwrap();

        let b = h.lifecycle.create(&x, gig()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden_regardless_of_patch() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let y = actor("usr-y", Role::User);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let patches = [
            UpdateEventRequest::default(),
            UpdateEventRequest {
                title: Some("Mine now".to_string()),
                ..Default::default()
            },
            UpdateEventRequest {
                title: Some("   ".to_string()),
                location: Some(GeoPoint::new(999.0, 0.0)),
                ..Default::default()
            },
        ];
        for patch in patches {
            let err = h.lifecycle.update(&y, &event.id, patch).await.unwrap_err();
            assert!(matches!(err, Error::Forbidden(_)), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_admin_can_update_when_bypass_enabled() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let admin = actor("usr-admin", Role::Admin);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let patch = UpdateEventRequest {
            description: Some("Moderated".to_string()),
            ..Default::default()
        };
        let updated = h.lifecycle.update(&admin, &event.id, patch).await.unwrap();
        assert_eq!(updated.description, "Moderated");
        assert_eq!(updated.owner, "usr-x");
    }

    #[tokio::test]
    async fn test_admin_blocked_when_bypass_disabled() {
        let h = harness_with(OwnershipGuard::new(false), NotificationDispatcher::disabled()).await;
        let x = actor("usr-x", Role::User);
        let admin = actor("usr-admin", Role::Admin);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let err = h.lifecycle.delete(&admin, &event.id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_event() {
        let h = harness().await;
        let err = h
            .lifecycle
            .update(
                &actor("usr-x", Role::User),
                "evt-missing",
                UpdateEventRequest::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_location_only_update_preserves_other_fields() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let before = h.lifecycle.create(&x, gig()).await.unwrap();

        let patch = UpdateEventRequest {
            location: Some(GeoPoint::new(2.35, 48.85)),
            ..Default::default()
        };
        let after = h.lifecycle.update(&x, &before.id, patch).await.unwrap();

        assert_eq!(after.location, GeoPoint::new(2.35, 48.85));
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, before.description);
        assert_eq!(after.date, before.date);
        assert_eq!(after.category, before.category);
        assert_eq!(after.owner, before.owner);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_empty_strings_leave_fields_untouched() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let before = h.lifecycle.create(&x, gig()).await.unwrap();

        let patch = UpdateEventRequest {
            title: Some(String::new()),
            description: Some(String::new()),
            category: Some(String::new()),
            ..Default::default()
        };
        let after = h.lifecycle.update(&x, &before.id, patch).await.unwrap();
        assert_eq!(after.title, "Gig");
        assert_eq!(after.description, "Live set");
        assert_eq!(after.category, "music");
    }

    #[tokio::test]
    async fn test_update_rejects_whitespace_title() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let patch = UpdateEventRequest {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            h.lifecycle.update(&x, &event.id, patch).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_onto_existing_key_conflicts() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let a = h.lifecycle.create(&x, gig()).await.unwrap();

        let mut talk = gig();
        talk.title = Some("Talk".to_string());
        let b = h.lifecycle.create(&x, talk).await.unwrap();

        let patch = UpdateEventRequest {
            title: Some("Gig".to_string()),
            ..Default::default()
        };
        match h.lifecycle.update(&x, &b.id, patch).await {
            Err(Error::Conflict { existing_id }) => assert_eq!(existing_id, a.id),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_keeping_key_is_not_a_conflict() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let patch = UpdateEventRequest {
            title: Some("Gig".to_string()),
            date: Some(parse_date("2025-06-01").unwrap()),
            description: Some("Same slot, new blurb".to_string()),
            ..Default::default()
        };
        let updated = h.lifecycle.update(&x, &event.id, patch).await.unwrap();
        assert_eq!(updated.description, "Same slot, new blurb");
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        h.lifecycle.delete(&x, &event.id).await.unwrap();
        let err = h.lifecycle.delete(&x, &event.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(matches!(
            h.lifecycle.get(&event.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_forbidden_delete_leaves_event_searchable() {
        let h = harness().await;
        let x = actor("usr-x", Role::User);
        let y = actor("usr-y", Role::User);
        let event = h.lifecycle.create(&x, gig()).await.unwrap();

        let err = h.lifecycle.delete(&y, &event.id).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let results = h.query.search(&EventFilter::default()).await.unwrap();
        assert!(results.iter().any(|e| e.id == event.id));
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_fail_operations() {
        let dispatcher = NotificationDispatcher::new(
            Arc::new(FailingNotifier),
            Arc::new(Localizer::default()),
            Duration::from_millis(100),
        );
        let h = harness_with(OwnershipGuard::default(), dispatcher).await;
        let x = actor("usr-x", Role::User);

        let event = h.lifecycle.create(&x, gig()).await.unwrap();
        let patch = UpdateEventRequest {
            category: Some("concert".to_string()),
            ..Default::default()
        };
        h.lifecycle.update(&x, &event.id, patch).await.unwrap();
        h.lifecycle.delete(&x, &event.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_notifications_sent_for_each_transition() {
        let recorder = Arc::new(RecordingNotifier::default());
        let dispatcher = NotificationDispatcher::new(
            recorder.clone(),
            Arc::new(Localizer::default()),
            Duration::from_secs(1),
        );
        let h = harness_with(OwnershipGuard::default(), dispatcher).await;
        let x = actor("usr-x", Role::User);

        let event = h.lifecycle.create(&x, gig()).await.unwrap();
        h.lifecycle
            .update(&x, &event.id, UpdateEventRequest::default())
            .await
            .unwrap();
        h.lifecycle.delete(&x, &event.id).await.unwrap();

        // Delivery is detached; give the tasks a moment
        let mut subjects = Vec::new();
        for _ in 0..50 {
            subjects = recorder
                .sent
                .lock()
                .await
                .iter()
                .map(|(_, s, _)| s.clone())
                .collect::<Vec<_>>();
            if subjects.len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        subjects.sort();
        assert_eq!(
            subjects,
            vec!["Event created", "Event deleted", "Event updated"]
        );
    }

    /// Repository whose pre-flight lookups never see duplicates, to model
    /// losing the race between the check and the write.
    struct BlindRepository {
        inner: JsonEventStore,
    }

    #[async_trait]
    impl EventRepository for BlindRepository {
        async fn find_one(
            &self,
            _predicate: crate::events::store::EventPredicate<'_>,
        ) -> Result<Option<Event>> {
            Ok(None)
        }

        async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, event: Event) -> Result<Event> {
            self.inner.insert(event).await
        }

        async fn save(&self, event: Event) -> Result<Event> {
            self.inner.save(event).await
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            self.inner.delete(id).await
        }

        async fn query(&self, filter: &EventFilter, radius_meters: f64) -> Result<Vec<Event>> {
            self.inner.query(filter, radius_meters).await
        }
    }

    #[tokio::test]
    async fn test_storage_rejection_after_clean_precheck_is_conflict() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(BlindRepository {
            inner: JsonEventStore::new(dir.path().join("events")).await.unwrap(),
        });
        let lifecycle = EventLifecycle::new(
            repo,
            OwnershipGuard::default(),
            NotificationDispatcher::disabled(),
        );
        let x = actor("usr-x", Role::User);

        lifecycle.create(&x, gig()).await.unwrap();
        let err = lifecycle.create(&x, gig()).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }), "got {:?}", err);
    }
}
