use std::sync::Arc;
use std::time::Duration;
use time::UtcOffset;
use tokio::sync::broadcast;
use uuid::Uuid;
use validator::Validate;

use super::clock::Clock;
use super::collaborators::{BookingNotifier, CoachDirectory};
use super::error::{BookingError, BookingResult};
use super::events::{EventBus, LedgerEvent, LedgerEventKind};
use super::ledger::{AppointmentLedger, CasOutcome};
use super::transitions::{self, Transition};
use crate::config::BookingConfig;
use crate::db::{Actor, Appointment, AppointmentStatus, BookingRequest, UserRole};

const MAX_CAS_ATTEMPTS: usize = 3;

/// Booking transaction manager: commits bookings and drives the
/// appointment state machine against the ledger.
#[derive(Clone)]
pub struct BookingService {
    ledger: Arc<dyn AppointmentLedger>,
    coaches: Arc<dyn CoachDirectory>,
    notifier: Arc<dyn BookingNotifier>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    config: BookingConfig,
}

impl BookingService {
    pub fn new(
        ledger: Arc<dyn AppointmentLedger>,
        coaches: Arc<dyn CoachDirectory>,
        notifier: Arc<dyn BookingNotifier>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        config: BookingConfig,
    ) -> Self {
        Self {
            ledger,
            coaches,
            notifier,
            clock,
            events,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub async fn book(&self, actor: &Actor, request: BookingRequest) -> BookingResult<Appointment> {
        request.validate()?;
        if actor.role != UserRole::Student {
            return Err(BookingError::Unauthorized(
                "only students can book appointments".to_string(),
            ));
        }
        if actor.user_id == request.coach_id {
            return Err(BookingError::Unauthorized(
                "a coach cannot book their own time".to_string(),
            ));
        }
        if self.coaches.find_coach(request.coach_id).await?.is_none() {
            return Err(BookingError::coach_not_found(request.coach_id));
        }

        // Slot starts are whole seconds; a sub-second instant can never match one.
        if request.datetime.nanosecond() != 0 {
            return Err(BookingError::Validation(
                "appointment time must be a whole second".to_string(),
            ));
        }
        let datetime = request.datetime.to_offset(UtcOffset::UTC);

        let now = self.clock.now();
        if datetime <= now {
            return Err(BookingError::Validation(
                "appointment time must be in the future".to_string(),
            ));
        }

        let appointment = Appointment {
            id: Uuid::now_v7(),
            coach_id: request.coach_id,
            student_id: actor.user_id,
            datetime,
            duration_minutes: request
                .duration_minutes
                .unwrap_or(self.config.default_duration_minutes),
            status: AppointmentStatus::Pending,
            notes: request.notes.unwrap_or_default().trim().to_string(),
            cancel_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            hidden_from: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        let created = match self.ledger.insert_if_slot_free(appointment).await {
            Ok(created) => created,
            Err(err @ BookingError::SlotAlreadyTaken { .. }) => {
                tracing::info!(
                    coach_id = %request.coach_id,
                    student_id = %actor.user_id,
                    %datetime,
                    "Booking rejected, slot already taken"
                );
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        tracing::info!(
            appointment_id = %created.id,
            coach_id = %created.coach_id,
            student_id = %created.student_id,
            datetime = %created.datetime,
            "Appointment booked"
        );
        self.events.publish(LedgerEventKind::Created, &created);
        Ok(created)
    }

    pub async fn confirm(&self, actor: &Actor, id: Uuid) -> BookingResult<Appointment> {
        let confirmed = self.transition(actor, id, Transition::Confirm, None).await?;
        tokio::spawn(notify_confirmed(
            self.notifier.clone(),
            self.config.notify_timeout,
            confirmed.clone(),
        ));
        Ok(confirmed)
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid, reason: Option<String>) -> BookingResult<Appointment> {
        self.transition(actor, id, Transition::Cancel, reason.as_deref()).await
    }

    pub async fn complete(&self, actor: &Actor, id: Uuid) -> BookingResult<Appointment> {
        self.transition(actor, id, Transition::Complete, None).await
    }

    /// Soft-deletes a cancelled appointment from the actor's own lists.
    pub async fn hide(&self, actor: &Actor, id: Uuid) -> BookingResult<Appointment> {
        self.transition(actor, id, Transition::Hide, None).await
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> BookingResult<Appointment> {
        let appointment = self
            .ledger
            .get(id)
            .await?
            .ok_or_else(|| BookingError::appointment_not_found(id))?;
        if appointment.is_participant(actor.user_id) || actor.is_admin() {
            Ok(appointment)
        } else {
            Err(BookingError::Unauthorized(format!(
                "user {} is not a participant of appointment {}",
                actor.user_id, id
            )))
        }
    }

    /// The actor's own appointments, newest first, without the ones they hid.
    pub async fn list_for(&self, actor: &Actor) -> BookingResult<Vec<Appointment>> {
        let appointments = match actor.role {
            UserRole::Coach => self.ledger.list_for_coach(actor.user_id).await?,
            UserRole::Student => self.ledger.list_for_student(actor.user_id).await?,
            UserRole::Admin => {
                return Err(BookingError::Validation(
                    "admins list appointments per coach or student".to_string(),
                ))
            }
        };
        Ok(appointments
            .into_iter()
            .filter(|a| !a.is_hidden_for(actor.user_id))
            .collect())
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        transition: Transition,
        reason: Option<&str>,
    ) -> BookingResult<Appointment> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self
                .ledger
                .get(id)
                .await?
                .ok_or_else(|| BookingError::appointment_not_found(id))?;

            let updated = match transitions::apply(&current, actor, transition, reason, self.clock.now())? {
                Some(updated) => updated,
                None => return Ok(current),
            };

            match self.ledger.compare_and_swap(current.version, updated).await? {
                CasOutcome::Applied(saved) => {
                    tracing::info!(
                        appointment_id = %saved.id,
                        actor_id = %actor.user_id,
                        actor = transitions::participant_role(&saved, actor.user_id).unwrap_or("unknown"),
                        from = %current.status,
                        to = %saved.status,
                        action = %transition,
                        "Appointment updated"
                    );
                    let kind = if transition == Transition::Hide {
                        LedgerEventKind::Hidden
                    } else {
                        LedgerEventKind::StatusChanged
                    };
                    self.events.publish(kind, &saved);
                    return Ok(saved);
                }
                CasOutcome::Stale(latest) => {
                    tracing::debug!(
                        appointment_id = %id,
                        expected_version = current.version,
                        found_version = latest.version,
                        attempt,
                        "Concurrent appointment write, re-validating"
                    );
                    // Lost a race against another transition: the caller acted on a
                    // state that no longer exists. Bumps that keep the status (a
                    // hide by the other party) are retried.
                    if latest.status != current.status {
                        return Err(BookingError::InvalidTransition {
                            from: latest.status,
                            action: transition,
                        });
                    }
                    if attempt >= MAX_CAS_ATTEMPTS {
                        tracing::warn!(
                            appointment_id = %id,
                            attempts = attempt,
                            action = %transition,
                            "Appointment kept changing underneath, giving up"
                        );
                        return Err(BookingError::Contended(id));
                    }
                }
            }
        }
    }
}

/// Best effort and detached from the request: the confirmation is already
/// committed when this runs.
async fn notify_confirmed(notifier: Arc<dyn BookingNotifier>, limit: Duration, appointment: Appointment) {
    let call = notifier.notify_booking_confirmed(
        appointment.coach_id,
        appointment.student_id,
        appointment.id,
    );
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(
            appointment_id = %appointment.id,
            error = %err,
            "Confirmation notification failed"
        ),
        Err(_) => tracing::warn!(
            appointment_id = %appointment.id,
            timeout_ms = limit.as_millis() as u64,
            "Confirmation notification timed out"
        ),
    }
}
