pub mod booking;
pub mod cancellation;
pub mod lifecycle;

pub use booking::AppointmentService;
pub use lifecycle::{AppointmentStateMachine, Ownership};
