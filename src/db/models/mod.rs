mod appointment;
mod coach;
mod formats;
mod schedule;
mod user;

pub use appointment::*;
pub use coach::*;
pub use formats::{hh_mm, iso_date};
pub use schedule::*;
pub use user::*;
