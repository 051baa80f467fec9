mod appointment_repository;
mod coach_repository;
mod schedule_repository;

pub use appointment_repository::AppointmentRepository;
pub use coach_repository::CoachRepository;
pub use schedule_repository::ScheduleRepository;
