pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;
pub mod state;

pub use models::*;
pub use repository::{AppointmentRepository, CancellationRepository};
pub use state::AppointmentCellState;
