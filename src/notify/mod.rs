//! Notify module — best-effort lifecycle notifications
//!
//! The event lifecycle announces created/updated/deleted transitions to the
//! acting user's email address. Delivery is decoupled from the request: a
//! failed or slow notifier never changes an operation's outcome.

pub mod dispatcher;
pub mod i18n;
pub mod notifier;

pub use dispatcher::{LifecycleKind, NotificationDispatcher};
pub use i18n::Localizer;
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
