//! Ownership guard for event mutation

use crate::error::{Error, Result};
use crate::events::types::Event;
use crate::identity::Actor;

/// Outcome of an ownership check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// Decides whether an actor may update or delete an event
#[derive(Debug, Clone, Copy)]
pub struct OwnershipGuard {
    admin_bypass: bool,
}

impl Default for OwnershipGuard {
    fn default() -> Self {
        Self { admin_bypass: true }
    }
}

impl OwnershipGuard {
    pub fn new(admin_bypass: bool) -> Self {
        Self { admin_bypass }
    }

    /// Owners may always mutate; admins only when the bypass is enabled
    pub fn authorize(&self, actor: &Actor, event: &Event) -> Decision {
        if actor.id == event.owner || (self.admin_bypass && actor.is_admin()) {
            Decision::Allowed
        } else {
            Decision::Denied
        }
    }

    /// Fail-closed check: unknown event is `NotFound`, denial is `Forbidden`
    pub fn enforce<'a>(
        &self,
        actor: &Actor,
        event: Option<&'a Event>,
        event_id: &str,
        action: &str,
    ) -> Result<&'a Event> {
        let event = event.ok_or_else(|| Error::NotFound(format!("Event {}", event_id)))?;
        match self.authorize(actor, event) {
            Decision::Allowed => Ok(event),
            Decision::Denied => {
                tracing::info!(
                    actor_id = %actor.id,
                    event_id = %event.id,
                    action = action,
                    "Ownership check denied"
                );
                Err(Error::Forbidden(format!("not authorized to {} this event", action)))
            }
        }
    }
}
