pub mod identity;
pub mod language;
pub mod timeout;
pub mod tracing;
