pub mod handlers;
pub mod routes;

pub use routes::schedule_routes;
