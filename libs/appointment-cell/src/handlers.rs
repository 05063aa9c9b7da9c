use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_caller;

use crate::models::{
    AppointmentView, CancelAppointmentRequest, CompleteAppointmentRequest,
    ConfirmAppointmentRequest, CreateAppointmentRequest, DoctorAppointmentsQuery,
    PatientAppointmentsQuery,
};
use crate::state::AppointmentCellState;

fn listing(appointments: Vec<AppointmentView>) -> Json<Value> {
    if appointments.is_empty() {
        return Json(json!({
            "appointments": [],
            "total": 0,
            "message": "No appointments found"
        }));
    }

    Json(json!({
        "total": appointments.len(),
        "appointments": appointments
    }))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let caller = resolve_caller(&user)?;
    let appointment = state.appointments.create(&caller, request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "appointment": appointment,
        "message": "Appointment requested successfully"
    }))))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let appointment = state.appointments.get(&caller, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn list_doctor_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(query): Query<DoctorAppointmentsQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let appointments = state.appointments.doctor_appointments(&caller, query).await?;
    Ok(listing(appointments))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(query): Query<PatientAppointmentsQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let appointments = state.appointments.patient_appointments(&caller, query).await?;
    Ok(listing(appointments))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<ConfirmAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let appointment = state.appointments.confirm(&caller, appointment_id, request).await?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": format!("Appointment is now {}", appointment.status)
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let appointment = state.appointments.complete(&caller, appointment_id, request).await?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": "Appointment completed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    let (appointment, cancellation) = state.appointments.cancel(&caller, appointment_id, request).await?;

    Ok(Json(json!({
        "appointment": appointment,
        "cancellation": cancellation,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = resolve_caller(&user)?;
    state.appointments.delete(&caller, appointment_id).await?;

    Ok(Json(json!({
        "id": appointment_id,
        "message": "Appointment deleted"
    })))
}
