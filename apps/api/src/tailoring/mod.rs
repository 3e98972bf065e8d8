// Tailoring: the request surface over the crew pipeline.
// handlers.rs speaks HTTP; service.rs owns one run's resources end to end.

pub mod handlers;
pub mod service;

pub use service::tailor;
