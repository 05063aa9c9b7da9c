use std::sync::Arc;

use axum::{
    Router,
    routing::{get, patch, post},
    middleware,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::AppointmentCellState;

pub fn appointment_routes(state: Arc<AppointmentCellState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/doctor", get(handlers::list_doctor_appointments))
        .route("/patient", get(handlers::list_patient_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment).delete(handlers::delete_appointment))

        // Lifecycle transitions
        .route("/{appointment_id}/confirm", patch(handlers::confirm_appointment))
        .route("/{appointment_id}/complete", patch(handlers::complete_appointment))
        .route("/{appointment_id}/cancel", patch(handlers::cancel_appointment))

        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
