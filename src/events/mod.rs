//! Events module — event lifecycle, search and ownership
//!
//! Provides REST endpoints for creating, searching, updating and deleting
//! events. Events are persisted as JSON files under `~/.eventdesk/events/`
//! and are unique on their (title, date) pair.

pub mod duplicate;
pub mod handler;
pub mod lifecycle;
pub mod ownership;
pub mod query;
pub mod store;
pub mod types;

pub use duplicate::DuplicateDetector;
pub use handler::{events_router, EventsState};
pub use lifecycle::EventLifecycle;
pub use ownership::{Decision, OwnershipGuard};
pub use query::{EventFilter, EventSequence, QueryEngine};
pub use store::{EventRepository, JsonEventStore};
pub use types::{CreateEventRequest, Event, UpdateEventRequest};
