use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::{Actor, Appointment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    Created,
    StatusChanged,
    Hidden,
}

/// Published after every committed ledger write.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEvent {
    pub kind: LedgerEventKind,
    pub appointment: Appointment,
}

impl LedgerEvent {
    pub fn concerns(&self, user_id: Uuid) -> bool {
        self.appointment.is_participant(user_id)
    }

    /// Whether a live subscriber sees this event. Admins see every
    /// appointment; one the actor hid only reports the actor's own hide.
    pub fn visible_to(&self, actor: &Actor) -> bool {
        if !actor.is_admin() && !self.concerns(actor.user_id) {
            return false;
        }
        if !self.appointment.is_hidden_for(actor.user_id) {
            return true;
        }
        self.kind == LedgerEventKind::Hidden
            && self.appointment.hidden_from.last() == Some(&actor.user_id)
    }
}

/// Fan-out of ledger changes to live subscribers (websocket sessions).
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, kind: LedgerEventKind, appointment: &Appointment) {
        let event = LedgerEvent {
            kind,
            appointment: appointment.clone(),
        };
        // No subscribers is the normal case between sessions.
        if self.tx.send(event).is_err() {
            tracing::trace!(appointment_id = %appointment.id, "No ledger subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }
}
