//! Scheduling core: weekly templates, slot expansion, the appointment
//! ledger, availability reconciliation and booking transactions.

pub mod clock;
pub mod collaborators;
pub mod error;
pub mod events;
pub mod expander;
pub mod ledger;
pub mod memory;
pub mod reconciler;
pub mod schedule;
pub mod service;
pub mod transitions;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collaborators::{BookingNotifier, CoachDirectory, LogNotifier};
pub use error::{BookingError, BookingResult};
pub use events::{EventBus, LedgerEvent, LedgerEventKind};
pub use expander::{expand, windows_for_date, SlotExpansion};
pub use ledger::{AppointmentLedger, CasOutcome};
pub use memory::{InMemoryCoachDirectory, InMemoryLedger, InMemoryScheduleStore};
pub use reconciler::{AvailabilityReconciler, CandidateSlot, DaySlots};
pub use schedule::{ScheduleService, ScheduleStore};
pub use service::BookingService;
pub use transitions::Transition;
