//! EventDesk - event management backend
//!
//! Authenticated users create, search, update and delete events. Each event
//! is unique on its (title, date) pair, carries a geographic location, and
//! may only be mutated by its owner or, when enabled, an administrator.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP (axum): /api/v1/events/*   /api/v1/auth/{register,me}
//!        │
//!        ├── CurrentActor ──► IdentityResolver ──► JWT + user directory
//!        │
//!        ├── search ───────► QueryEngine ─────────┐
//!        │                                        ▼
//!        └── mutate ───────► EventLifecycle ──► EventRepository (JSON files)
//!                             │  DuplicateDetector
//!                             │  OwnershipGuard
//!                             └► NotificationDispatcher ──► Notifier (detached)
//! ```
//!
//! ## Modules
//!
//! - [`api`]: Router assembly, CORS and tracing
//! - [`events`]: Event lifecycle, search, ownership and storage
//! - [`identity`]: Bearer token verification and the user directory
//! - [`notify`]: Best-effort lifecycle notifications and localization
//! - [`geo`]: Coordinates and great-circle distance
//! - [`storage`]: JSON-file persistence helpers
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod identity;
pub mod notify;
pub mod storage;

pub use config::EventDeskConfig;
pub use error::{Error, Result};
