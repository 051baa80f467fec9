//! Boundaries to the services the booking core relies on but does not own.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::BookingResult;
use crate::db::CoachProfile;

/// Coach directory kept by the profile service.
#[async_trait]
pub trait CoachDirectory: Send + Sync {
    async fn find_coach(&self, coach_id: Uuid) -> BookingResult<Option<CoachProfile>>;
}

/// Messaging side of a confirmed booking: opens the coach/student thread and
/// posts the welcome message.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify_booking_confirmed(
        &self,
        coach_id: Uuid,
        student_id: Uuid,
        appointment_id: Uuid,
    ) -> anyhow::Result<()>;
}

/// Notifier for deployments without a messaging service attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn notify_booking_confirmed(
        &self,
        coach_id: Uuid,
        student_id: Uuid,
        appointment_id: Uuid,
    ) -> anyhow::Result<()> {
        tracing::info!(
            %coach_id,
            %student_id,
            %appointment_id,
            "Booking confirmed, welcome message queued for conversation"
        );
        Ok(())
    }
}
