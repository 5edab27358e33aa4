//! Best-effort lifecycle notification dispatch
//!
//! Each notification runs in its own detached tokio task bounded by a
//! timeout. Failures and timeouts are logged and never reach the caller.

use crate::events::types::Event;
use crate::notify::i18n::Localizer;
use crate::notify::notifier::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Lifecycle transition being announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Created,
    Updated,
    Deleted,
}

impl LifecycleKind {
    fn key(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fans lifecycle notifications out to a [`Notifier`]
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Option<Arc<dyn Notifier>>,
    localizer: Arc<Localizer>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, localizer: Arc<Localizer>, timeout: Duration) -> Self {
        Self {
            notifier: Some(notifier),
            localizer,
            timeout,
        }
    }

    /// Dispatcher that drops every notification
    pub fn disabled() -> Self {
        Self {
            notifier: None,
            localizer: Arc::new(Localizer::default()),
            timeout: Duration::from_secs(1),
        }
    }

    /// Spawn delivery of a lifecycle notification to `to`.
    ///
    /// Returns the task handle (`None` when disabled). Callers on the
    /// request path drop it.
    pub fn dispatch(&self, kind: LifecycleKind, to: &str, event: &Event) -> Option<JoinHandle<()>> {
        let notifier = self.notifier.clone()?;

        let date = event.date.to_rfc3339();
        let args = [("title", event.title.as_str()), ("date", date.as_str())];
        let subject = self
            .localizer
            .translate(&format!("event.{}.subject", kind.key()));
        let body = self
            .localizer
            .translate_with(&format!("event.{}.body", kind.key()), &args);

        let to = to.to_string();
        let event_id = event.id.clone();
        let timeout = self.timeout;

        Some(tokio::spawn(async move {
            match tokio::time::timeout(timeout, notifier.notify(&to, &subject, &body)).await {
                Ok(Ok(())) => {
                    tracing::debug!(event_id = %event_id, kind = %kind, backend = notifier.name(), "Notification sent");
                }
                Ok(Err(e)) => {
                    tracing::warn!(event_id = %event_id, kind = %kind, "Notification failed: {}", e);
                }
                Err(_) => {
                    tracing::warn!(event_id = %event_id, kind = %kind, "Notification timed out after {:?}", timeout);
                }
            }
        }))
    }
}
