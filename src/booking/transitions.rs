//! Appointment state machine.
//!
//! ```text
//! pending ──confirm──▶ confirmed ──complete──▶ completed
//!    │                     │
//!    └──────cancel─────────┴──────▶ cancelled ──hide (per participant)
//! ```
//!
//! Authorization is decided before the state: a caller without the required
//! relation to the appointment gets `Unauthorized` whatever the status is.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{BookingError, BookingResult};
use crate::db::{Actor, Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Confirm,
    Cancel,
    Complete,
    Hide,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Confirm => "confirm",
            Transition::Cancel => "cancel",
            Transition::Complete => "complete",
            Transition::Hide => "hide",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn authorize(appointment: &Appointment, actor: &Actor, transition: Transition) -> BookingResult<()> {
    let allowed = match transition {
        Transition::Confirm | Transition::Complete => appointment.coach_id == actor.user_id,
        Transition::Cancel | Transition::Hide => appointment.is_participant(actor.user_id),
    };
    if allowed {
        Ok(())
    } else {
        Err(BookingError::Unauthorized(format!(
            "user {} may not {} appointment {}",
            actor.user_id, transition, appointment.id
        )))
    }
}

/// Status reached by applying `transition` to `from`.
pub fn next_status(from: AppointmentStatus, transition: Transition) -> BookingResult<AppointmentStatus> {
    use AppointmentStatus::*;

    match (from, transition) {
        (Cancelled, Transition::Hide) => Ok(Cancelled),
        (from, action) if from.is_terminal() => Err(BookingError::InvalidTransition { from, action }),
        (Pending, Transition::Confirm) => Ok(Confirmed),
        (Pending | Confirmed, Transition::Cancel) => Ok(Cancelled),
        (Confirmed, Transition::Complete) => Ok(Completed),
        (from, action) => Err(BookingError::InvalidTransition { from, action }),
    }
}

/// Computes the record after the transition. `None` means nothing changes
/// (re-hiding an appointment already hidden for the actor).
pub fn apply(
    appointment: &Appointment,
    actor: &Actor,
    transition: Transition,
    reason: Option<&str>,
    now: OffsetDateTime,
) -> BookingResult<Option<Appointment>> {
    authorize(appointment, actor, transition)?;
    let status = next_status(appointment.status, transition)?;

    let mut updated = appointment.clone();
    match transition {
        Transition::Hide => {
            if appointment.is_hidden_for(actor.user_id) {
                return Ok(None);
            }
            updated.hidden_from.push(actor.user_id);
        }
        Transition::Cancel => {
            updated.cancelled_by = Some(actor.user_id);
            updated.cancelled_at = Some(now);
            updated.cancel_reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string);
        }
        Transition::Confirm | Transition::Complete => {}
    }
    updated.status = status;
    updated.updated_at = now;
    Ok(Some(updated))
}

pub fn participant_role(appointment: &Appointment, user_id: Uuid) -> Option<&'static str> {
    if appointment.coach_id == user_id {
        Some("coach")
    } else if appointment.student_id == user_id {
        Some("student")
    } else {
        None
    }
}
