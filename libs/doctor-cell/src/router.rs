use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::DoctorCellState;

pub fn doctor_routes(state: Arc<DoctorCellState>) -> Router {
    Router::new()
        // Own schedule, doctors only
        .route("/schedule", post(handlers::configure_schedule).get(handlers::get_own_schedule))
        .route("/schedule/leave", patch(handlers::set_leave))

        // Availability lookups for any signed-in user
        .route("/available/{date}", get(handlers::get_available_doctors))
        .route("/{doctor_id}/schedule", get(handlers::get_doctor_schedule))
        .route("/{doctor_id}/slots/{date}", get(handlers::get_doctor_slots))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
